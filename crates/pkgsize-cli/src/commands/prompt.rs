//! Interactive prompt loop.

use std::io::{self, BufRead, Write};

use pkgsize_core::error::{PkgSizeError, PkgSizeResult};

use super::{measure, CommandContext, Session};

const PROMPT: &str = "Enter a package name: ";
const EMPTY_INPUT: &str = "-- Your input was empty";

/// Prompt until a non-blank line is read.
///
/// Returns the trimmed name, or `None` at end of input.
pub fn read_package_name<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> io::Result<Option<String>> {
    loop {
        write!(writer, "{}", PROMPT)?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            writeln!(writer)?;
            return Ok(None);
        }

        let name = line.trim();
        if name.is_empty() {
            writeln!(writer, "{}", EMPTY_INPUT)?;
            continue;
        }

        return Ok(Some(name.to_string()));
    }
}

async fn next_package_name() -> PkgSizeResult<Option<String>> {
    let read = tokio::task::spawn_blocking(|| {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        read_package_name(&mut stdin.lock(), &mut stdout)
    })
    .await
    .map_err(|e| {
        PkgSizeError::io(
            "Prompt task failed".to_string(),
            io::Error::new(io::ErrorKind::Other, e),
        )
    })?;

    read.map_err(|e| PkgSizeError::io("Failed to read from stdin".to_string(), e))
}

/// Measure packages entered at the prompt until end of input
pub async fn execute(session: &Session, ctx: &CommandContext) -> PkgSizeResult<()> {
    ctx.output.info(&format!(
        "Measuring packages from {} (Ctrl-D to quit)",
        session.registry_url
    ));

    while let Some(name) = next_package_name().await? {
        // A failed lookup should not end the session
        if let Err(err) = measure::measure_and_print(session, &name, ctx).await {
            ctx.output.error(&err);
        }
    }

    Ok(())
}
