//! Printing the popup status line on the terminal.

use std::future::Future;

use cordial_core::{PopupController, StatusKind, StatusLine};

fn print_progress(line: &StatusLine) {
    match line.kind {
        StatusKind::Loading => eprintln!("… {}", line.message),
        StatusKind::Error => eprintln!("✕ {}", line.message),
        StatusKind::Success | StatusKind::Info => eprintln!("{}", line.message),
    }
}

/// Drive `action` while echoing the intermediate status lines it publishes.
///
/// The action's own result is returned; its final line is not printed.
pub(crate) async fn follow<F, T>(popup: &PopupController, action: F) -> T
where
    F: Future<Output = T>,
{
    let mut status = popup.subscribe();
    status.borrow_and_update();
    tokio::pin!(action);

    loop {
        tokio::select! {
            biased;
            line = &mut action => return line,
            Ok(()) = status.changed() => {
                let current = status.borrow_and_update().clone();
                if let Some(line) = current {
                    if line.kind == StatusKind::Loading || line.is_error() {
                        print_progress(&line);
                    }
                }
            }
        }
    }
}

/// Turn the final status line into the command's outcome.
pub(crate) fn finish(line: StatusLine) -> Result<(), Box<dyn std::error::Error>> {
    if line.is_error() {
        return Err(line.message.into());
    }
    match line.kind {
        StatusKind::Success => println!("✓ {}", line.message),
        _ => println!("{}", line.message),
    }
    Ok(())
}
