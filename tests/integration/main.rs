//! Integration tests for actkit

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn actkit() -> Command {
        cargo_bin_cmd!("actkit")
    }

    /// Workspace, cache and artifact directories isolated per test
    struct Sandbox {
        temp: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let ws = temp.path().join("ws");
            fs::create_dir_all(ws.join("dist/lib")).unwrap();
            fs::create_dir_all(ws.join("src")).unwrap();
            fs::write(ws.join("dist/app.txt"), "app").unwrap();
            fs::write(ws.join("dist/lib/util.txt"), "util").unwrap();
            fs::write(ws.join("src/main.rs"), "fn main() {}").unwrap();
            Self { temp }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.temp.path().join(rel)
        }

        fn cmd(&self) -> Command {
            self.cmd_in("ws")
        }

        fn cmd_in(&self, workspace: &str) -> Command {
            let ws = self.path(workspace);
            let mut cmd = actkit();
            cmd.current_dir(&ws)
                .env("GITHUB_WORKSPACE", &ws)
                .env("ACTKIT_CACHE_DIR", self.path("caches"))
                .env("ACTKIT_ARTIFACT_DIR", self.path("artifacts"))
                .env("GITHUB_SERVER_URL", "https://github.com")
                .env("ACTKIT_CONFIG", self.path("config.toml"));
            cmd
        }
    }

    #[test]
    fn help_displays() {
        actkit()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("local CI cache and artifact services"));
    }

    #[test]
    fn version_displays() {
        actkit()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("actkit"));
    }

    #[test]
    fn config_path() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"));
    }

    #[test]
    fn config_init_writes_file() {
        let sandbox = Sandbox::new();
        sandbox.cmd().args(["config", "init"]).assert().success();
        let written = fs::read_to_string(sandbox.path("config.toml")).unwrap();
        assert!(written.contains("compression_level = 6"));
    }

    #[test]
    fn artifact_lifecycle() {
        let sandbox = Sandbox::new();

        sandbox
            .cmd()
            .args(["artifact", "upload", "build", "--root", "dist"])
            .assert()
            .success()
            .stdout("1\n");
        assert!(sandbox.path("artifacts/build.zip").exists());

        sandbox
            .cmd()
            .args(["artifact", "upload", "build", "--root", "dist"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "An artifact with the name build already exists",
            ));

        sandbox
            .cmd()
            .args(["artifact", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout("build\n");

        sandbox
            .cmd()
            .args(["artifact", "get", "build", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"name\": \"build\"").and(predicate::str::contains("\"id\": 1")));

        sandbox
            .cmd()
            .args(["artifact", "download", "1", "--path", "out"])
            .assert()
            .success();
        assert_eq!(
            fs::read_to_string(sandbox.path("ws/out/app.txt")).unwrap(),
            "app"
        );
        assert_eq!(
            fs::read_to_string(sandbox.path("ws/out/lib/util.txt")).unwrap(),
            "util"
        );

        sandbox
            .cmd()
            .args(["artifact", "delete", "build"])
            .assert()
            .success()
            .stdout("1\n");
        assert!(!sandbox.path("artifacts/build.zip").exists());

        sandbox
            .cmd()
            .args(["artifact", "get", "build"])
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("Artifact not found for name: build")
                    .and(predicate::str::contains("actkit artifact list")),
            );
    }

    #[test]
    fn artifact_ids_are_not_reused() {
        let sandbox = Sandbox::new();
        let upload = |name: &str, root: &str, id: &str| {
            sandbox
                .cmd()
                .args(["artifact", "upload", name, "--root", root])
                .assert()
                .success()
                .stdout(format!("{id}\n"));
        };

        upload("alpha", "dist", "1");
        upload("beta", "src", "2");
        sandbox
            .cmd()
            .args(["artifact", "delete", "alpha"])
            .assert()
            .success()
            .stdout("1\n");
        upload("gamma", "dist", "3");

        sandbox
            .cmd()
            .args(["artifact", "download", "2", "--path", "beta-out"])
            .assert()
            .success();
        assert!(sandbox.path("ws/beta-out/main.rs").exists());
        assert!(!sandbox.path("ws/beta-out/app.txt").exists());
    }

    #[test]
    fn artifact_name_validated() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["artifact", "upload", "bad<name", "--root", "dist"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("The artifact name is not valid: bad<name"));
    }

    #[test]
    fn artifact_missing_root() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["artifact", "upload", "build", "a.txt", "--root", "nowhere"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("The provided rootDirectory nowhere does not exist"));
    }

    #[test]
    fn artifact_rejected_on_enterprise_server() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .env("GITHUB_SERVER_URL", "https://github.example.com")
            .args(["artifact", "list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not currently supported on GHES"));
    }

    #[test]
    fn cache_miss_is_not_an_error() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["cache", "restore", "-p", "src/", "-k", "cache-key"])
            .assert()
            .success()
            .stdout("")
            .stderr(predicate::str::contains("Cache not found for input keys: cache-key"));
    }

    #[test]
    fn cache_requires_paths() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["cache", "restore", "-k", "cache-key"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "Path Validation Error: At least one directory or file path is required",
            ));
    }

    #[test]
    fn cache_key_limit() {
        let sandbox = Sandbox::new();
        let mut cmd = sandbox.cmd();
        cmd.args(["cache", "restore", "-p", "src", "-k", "primary"]);
        for i in 0..10 {
            cmd.args(["-r", &format!("restore-{i}")]);
        }
        cmd.assert().failure().stderr(predicate::str::contains(
            "Key Validation Error: Keys are limited to a maximum of 10.",
        ));
    }

    #[test]
    fn cache_key_rejects_commas() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["cache", "save", "-p", "src", "-k", "a,b"])
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "Key Validation Error: a,b cannot contain commas.",
            ));
    }

    #[test]
    fn cache_dir_required() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .env_remove("ACTKIT_CACHE_DIR")
            .args(["cache", "restore", "-p", "src", "-k", "k"])
            .assert()
            .failure()
            .stderr(
                predicate::str::contains("Environment variable ACTKIT_CACHE_DIR is not set")
                    .and(predicate::str::contains("Hint:")),
            );
    }

    #[test]
    fn cache_version_is_stable() {
        let sandbox = Sandbox::new();
        let run = || {
            let out = sandbox
                .cmd()
                .args(["cache", "version", "-p", "src", "--compression", "gzip"])
                .output()
                .unwrap();
            assert!(out.status.success());
            String::from_utf8(out.stdout).unwrap()
        };

        let first = run();
        assert_eq!(first.trim().len(), 64);
        assert_eq!(first, run());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn cache_save_then_restore() {
        let sandbox = Sandbox::new();
        fs::create_dir_all(sandbox.path("ws2")).unwrap();

        sandbox
            .cmd()
            .args(["cache", "save", "-p", "src", "-k", "deps-v1"])
            .assert()
            .success()
            .stdout("1\n");

        sandbox
            .cmd()
            .args(["cache", "save", "-p", "src", "-k", "deps-v1"])
            .assert()
            .success()
            .stdout("-1\n")
            .stderr(predicate::str::contains("Unable to reserve cache with key deps-v1"));

        sandbox
            .cmd_in("ws2")
            .args(["cache", "restore", "-p", "src", "-k", "deps-v2", "-r", "deps-"])
            .assert()
            .success()
            .stdout("deps-\n");
        assert_eq!(
            fs::read_to_string(sandbox.path("ws2/src/main.rs")).unwrap(),
            "fn main() {}"
        );
    }
}
