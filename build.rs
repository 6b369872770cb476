use std::process::{Command, Output};

fn command_output_to_string(output: Output) -> String {
    String::from_utf8(output.stdout).expect("valid utf-8 from command output")
}

fn execute_command(command: &mut Command) -> Option<Output> {
    let output = command.output().ok()?;
    if !output.status.success() { return None; }
    Some(output)
}

fn setup_version_env() {
    let mut version_str = "v".to_owned() + env!("CARGO_PKG_VERSION");

    if execute_command(Command::new("git").args(["--version"])).is_some() {
        if let Some(output) = execute_command(Command::new("git").args(["rev-parse", "--short", "HEAD"])) {
            version_str.push_str("-");
            let output_str = command_output_to_string(output);
            version_str.push_str(output_str.trim_end());
        }

        if let Some(output) = execute_command(Command::new("git").args(["status", "--porcelain"])) {
            if !output.stdout.is_empty() {
                version_str.push_str("-dirty");
            }
        }

        if let Some(output) = execute_command(Command::new("git").args(["rev-parse", "--git-dir"])) {
            println!("cargo:rerun-if-changed={}", command_output_to_string(output).trim_end());
        }
    }
    else {
        println!("cargo:warning=Failed to execute git, version will not include a commit hash");
    }

    println!("cargo:rustc-env=PARAMLIB_DISPLAY_VERSION={}", version_str);
}

fn main() {
    setup_version_env();
}
