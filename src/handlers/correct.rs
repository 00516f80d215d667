//! `--correct`: ask the backend for a corrected version of the code.

use std::io::{self, Write};

use anyhow::Result;

use crate::client::DebugClient;
use crate::config::Config;
use crate::highlight::Language;
use crate::printer::TextPrinter;
use crate::session::{CorrectionPane, Effect};

pub struct CorrectHandler;

impl CorrectHandler {
    pub async fn run(cfg: &Config, code: &str, language: Language) -> Result<bool> {
        let client = DebugClient::from_config(cfg)?;
        let mut session = super::open_session(cfg, language);
        session.edit(code);

        let Some(Effect::Correct(ticket, req)) = session.request_correction() else {
            anyhow::bail!("could not start the correction");
        };
        let outcome = client.correct(&req).await;
        session.complete_correction(ticket, outcome);

        match session.correction() {
            CorrectionPane::Corrected { code, explanation } => {
                write_corrected(&mut io::stdout().lock(), code)?;
                if let Some(explanation) = explanation {
                    TextPrinter { color: Some("cyan") }.print("\nExplanation:");
                    println!("{}", explanation.trim_end());
                }
                Ok(true)
            }
            CorrectionPane::Failed(msg) => {
                TextPrinter { color: Some("red") }.print(msg);
                Ok(false)
            }
            CorrectionPane::Empty | CorrectionPane::Pending => Ok(false),
        }
    }
}

/// The corrected code goes out byte for byte; a newline is only added when
/// the code lacks a final one.
fn write_corrected(out: &mut impl Write, code: &str) -> io::Result<()> {
    out.write_all(code.as_bytes())?;
    if !code.is_empty() && !code.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(code: &str) -> String {
        let mut out = Vec::new();
        write_corrected(&mut out, code).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn corrected_code_is_written_verbatim() {
        assert_eq!(written("def f():\n    return 1\n\n"), "def f():\n    return 1\n\n");
        assert_eq!(written("x = 1"), "x = 1\n");
        assert!(!written("print('<b>')").contains('\x1b'));
    }
}
