use anyhow::Result;

use codedbg::cli::Cli;
use codedbg::config::Config;
use codedbg::handlers::{self, correct::CorrectHandler, run::RunHandler, chat::ChatHandler};
use codedbg::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Load config, then apply CLI overrides
    let mut cfg = Config::load();
    if let Some(url) = args.api_url.as_deref() {
        cfg.set("DEBUG_API_URL", url);
    }

    let file = args.file.as_deref();
    let language = handlers::resolve_language(args.language.as_deref(), file, &cfg)?;

    if args.is_interactive() {
        // The TUI owns the terminal; keep logs out of it
        logging::init_file(&cfg.log_file())?;
        tracing::debug!(config = %cfg.config_path.display(), "configuration loaded");
        let code = file.map(|p| handlers::read_source(Some(p))).transpose()?;
        return handlers::tui::run(cfg, code, language).await;
    }
    logging::init_stderr();
    tracing::debug!(config = %cfg.config_path.display(), "configuration loaded");

    let ok = if args.run {
        let code = handlers::read_source(file)?;
        let opts = handlers::run::RunOptions {
            stdin: args.input.clone(),
            stdin_file: args.input_file.clone(),
            questions: args.questions,
            steps: args.steps,
        };
        RunHandler::run(&cfg, &code, language, opts).await?
    } else if args.correct {
        let code = handlers::read_source(file)?;
        CorrectHandler::run(&cfg, &code, language).await?
    } else if args.highlight {
        let code = handlers::read_source(file)?;
        handlers::highlight::run(&code, language, args.html);
        true
    } else if let Some(prompt) = args.chat.as_deref() {
        ChatHandler::run(&cfg, prompt, !args.no_md).await?;
        true
    } else if args.history {
        handlers::history::list(&cfg);
        true
    } else if let Some(index) = args.show_history {
        handlers::history::show(&cfg, index)?;
        true
    } else {
        handlers::history::clear(&cfg);
        true
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
