// Command-line runner: plays a list of control events against one bin and writes
// every frame the dashboard would have shown as a numbered PNG.
//
//   trashlink [--out DIR] EVENT...
//   EVENT = biomedical | general | reset

use log::info;
use std::env;
use std::path::PathBuf;
use trashlink::{BinDashboard, ControlEvent, Frame, FrameSink, Result, save_png};

struct PngDirectorySink {
    dir: PathBuf,
    written: usize,
}

impl FrameSink for PngDirectorySink {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let path = self.dir.join(format!("frame_{:04}.png", self.written));
        save_png(&path, frame)?;
        self.written += 1;
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1).peekable();
    let mut out_dir = PathBuf::from("frames");
    if args.peek().map(String::as_str) == Some("--out") {
        args.next();
        match args.next() {
            Some(dir) => out_dir = PathBuf::from(dir),
            None => {
                println!("Usage: trashlink [--out DIR] <biomedical|general|reset>...");
                return Ok(());
            }
        }
    }

    // Reject the whole script before drawing anything.
    let events = args
        .map(|arg| arg.parse::<ControlEvent>())
        .collect::<Result<Vec<_>>>()?;
    if events.is_empty() {
        println!("Usage: trashlink [--out DIR] <biomedical|general|reset>...");
        return Ok(());
    }

    std::fs::create_dir_all(&out_dir)?;
    let mut sink = PngDirectorySink {
        dir: out_dir,
        written: 0,
    };
    let mut dashboard = BinDashboard::default();
    sink.present(&dashboard.snapshot())?;

    for event in events {
        let status = dashboard.dispatch(event, &mut sink)?;
        println!(
            "{event}: biomedical {}% general {}%",
            status.biomedical.level, status.general.level
        );
        for message in status.messages() {
            println!("  {message}");
        }
    }

    info!("wrote {} frames to {}", sink.written, sink.dir.display());
    Ok(())
}
