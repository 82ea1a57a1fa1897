use std::{env, fs, path::PathBuf, process::Command};

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "t_final = 50.0\n"
        + "dt = 10.0\n"
        + "num_types = 2\n"
        + "num_resources = 4\n"
        + "mutation_rate = 0.001\n"
        + "influx_rate = 1.0\n"
        + "decay_rate = 1.0\n"
        + "cost_baseline = 0.1\n"
        + "carrying_capacity = 1000.0\n"
        + "trait_pattern = \"single_trait\"\n"
        + "seed = 7\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    fn run_bin(args: &[&str]) {
        let bin = PathBuf::from(env!("CARGO_BIN_EXE_ecoevo"));

        let output = Command::new(bin)
            .args(args)
            .output()
            .expect("failed to execute command");

        let stdout_str =
            std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
        let stderr_str =
            std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

        assert!(
            output.status.success(),
            "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
        );
    }

    let config_path_str = config_path
        .to_str()
        .expect("failed to convert config path to string");

    run_bin(&["--config", config_path_str, "check"]);
    run_bin(&["--config", config_path_str, "run", "--poll-ms", "10"]);

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn per_resource_influx_config() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("per_resource_influx");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let config_path = test_dir.join("config.toml");
    let config_contents = String::new()
        + "t_final = 20.0\n"
        + "dt = 5.0\n"
        + "num_types = 1\n"
        + "num_resources = 3\n"
        + "mutation_rate = 0.0\n"
        + "influx_rate = [1.0, 0.5, 0.0]\n"
        + "decay_rate = 1.0\n"
        + "cost_baseline = 0.1\n"
        + "carrying_capacity = 100.0\n"
        + "trait_pattern = \"all_resources\"\n"
        + "seed = 11\n";

    fs::write(&config_path, config_contents).expect("failed to write config file");

    let bin = PathBuf::from(env!("CARGO_BIN_EXE_ecoevo"));
    let config_path_str = config_path
        .to_str()
        .expect("failed to convert config path to string");

    let output = Command::new(bin)
        .args(["--config", config_path_str, "run"])
        .output()
        .expect("failed to execute command");
    assert!(
        output.status.success(),
        "run failed:\nstderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );

    fs::remove_dir_all(&test_dir).ok();
}
