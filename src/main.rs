use std::io::{self, BufRead, Write};
use std::sync::Arc;

use agent_config::{error_log_file, history_file, sandbox_root, ConfigStore, PermissionsStore};
use local_agent::app::Session;
use local_agent::history::CommandHistory;
use local_agent::logging::{FileErrorLog, StdoutDisplay};
use local_agent::model::OllamaBackend;
use local_agent::tools::SandboxToolExecutor;

fn main() -> io::Result<()> {
    let cwd = std::env::current_dir()?;

    let config_store = ConfigStore::open(&cwd).map_err(io::Error::other)?;
    let permissions = Arc::new(PermissionsStore::open(&cwd).map_err(io::Error::other)?);
    let error_log = Arc::new(FileErrorLog::new(error_log_file(&cwd)));
    let display = Arc::new(StdoutDisplay);

    let backend = Arc::new(OllamaBackend::new(
        config_store.config().clone(),
        error_log.clone(),
    ));
    let executor =
        SandboxToolExecutor::new(sandbox_root(&cwd), permissions.clone(), display.clone())?;
    let history = CommandHistory::load(history_file(&cwd));

    let mut session = Session::new(
        config_store.config().clone(),
        backend,
        Box::new(executor),
        permissions,
        display,
        history,
    );

    println!("Own-CLI Agent (Ollama/Multi-Provider)");
    println!("Enter a goal or a message. Use /agent  /chat  /model  /tools  /reset  (exit to quit)");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} > ", session.status_line());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let input = line.trim();
        if matches!(input, "exit" | "quit") {
            break;
        }
        session.handle_input(input);
    }

    Ok(())
}
