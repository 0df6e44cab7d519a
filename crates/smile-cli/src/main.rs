use std::{env, fs, process::ExitCode, time::Instant};

use smile::{run::CompileOutcome, tracer::NoopTracer, Engine, Interns};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let file_path = if args.len() > 1 { &args[1] } else { "example.smile" };
    let code = match read_file(file_path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let (mut interns, symbols) = Interns::new();
    let ast = match smile::sexpr::read_one(&code, &mut interns) {
        Ok(ast) => ast,
        Err(err) => {
            eprintln!("error: could not read {file_path}: {err:?}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let (body, tables) = match Engine::<NoopTracer>::compile(&ast, &symbols) {
        CompileOutcome::Ready { body, tables, messages } => {
            for message in &messages {
                eprintln!("{}: {}", message.kind, message.message);
            }
            (body, tables)
        }
        CompileOutcome::Errors(messages) => {
            for message in &messages {
                eprintln!("{}: {}", message.kind, message.message);
            }
            return ExitCode::FAILURE;
        }
    };

    let engine = Engine::new();
    let value = match engine.run(interns, symbols, &body, &tables) {
        Ok(value) => value,
        Err(throw) => {
            let elapsed = start.elapsed();
            eprintln!("error after: {elapsed:?}\n{}: {}", throw.exc_type, throw.message);
            return ExitCode::FAILURE;
        }
    };
    let elapsed = start.elapsed();
    eprintln!("success after: {elapsed:?}\n{value:?}");
    ExitCode::SUCCESS
}

fn read_file(file_path: &str) -> Result<String, String> {
    eprintln!("Reading file: {file_path}");
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("Error: {file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("Error reading {file_path}: {err}"));
        }
    }
    match fs::read_to_string(file_path) {
        Ok(contents) => Ok(contents),
        Err(err) => Err(format!("Error reading file: {err}")),
    }
}
