//! Copy text to the system clipboard, falling back to an OSC 52 escape for
//! terminals reached over SSH or without a display server.

use std::io::{self, Write};

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STD;
use base64::Engine as _;

const MAX_OSC52_BYTES: usize = 100 * 1024;

/// Where the text ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Copied {
    System,
    Osc52,
}

/// Try the system clipboard first, then OSC 52 on stdout.
pub fn copy(text: &str) -> Result<Copied> {
    match arboard::Clipboard::new().and_then(|mut clip| clip.set_text(text.to_owned())) {
        Ok(()) => Ok(Copied::System),
        Err(err) => {
            tracing::debug!("system clipboard unavailable: {err}");
            let mut out = io::stdout();
            out.write_all(osc52_sequence(text).as_bytes())
                .and_then(|_| out.flush())
                .map_err(|e| anyhow!("clipboard and OSC 52 copy failed: {e}"))?;
            Ok(Copied::Osc52)
        }
    }
}

/// `ESC ] 52 ; c ; <base64> BEL`, truncated to keep terminal transfers small.
pub fn osc52_sequence(text: &str) -> String {
    let bytes = text.as_bytes();
    let payload = if bytes.len() > MAX_OSC52_BYTES {
        let mut end = MAX_OSC52_BYTES;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        &bytes[..end]
    } else {
        bytes
    };
    format!("\x1b]52;c;{}\x07", BASE64_STD.encode(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc52_encodes_payload() {
        assert_eq!(osc52_sequence("print(1)"), "\x1b]52;c;cHJpbnQoMSk=\x07");
    }

    #[test]
    fn osc52_truncates_on_char_boundary() {
        let text = "é".repeat(MAX_OSC52_BYTES);
        let seq = osc52_sequence(&text);
        let b64 = seq.trim_start_matches("\x1b]52;c;").trim_end_matches('\x07');
        let decoded = BASE64_STD.decode(b64).unwrap();
        assert_eq!(decoded.len(), MAX_OSC52_BYTES);
        assert!(String::from_utf8(decoded).is_ok());
    }
}
