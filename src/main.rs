use std::process::ExitCode;

fn main() -> ExitCode {
    let env = mergezone::env::RealEnv;
    ExitCode::from(mergezone::run(env))
}
