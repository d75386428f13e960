use std::process::ExitCode;

use pipenv_retrieval::main as retrieval_main;

fn main() -> ExitCode {
    retrieval_main(std::env::args_os())
}
