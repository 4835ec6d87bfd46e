//! Background decoder for the showcase image.
//! Decodes off-thread and hands RGBA8 frames back without blocking the
//! frame loop. A failed decode is reported so the viewer can keep running
//! with a transparent card.
use crossbeam_channel::{Receiver, Sender};
use std::{path::PathBuf, thread};
use tracing::warn;

/// Message sent to the background loader thread.
pub enum LoaderMsg {
    /// Decode this path at its native size.
    Decode(PathBuf),
    /// Stop the loader.
    Quit,
}

/// Result of one decode job.
pub enum LoaderEvent {
    /// RGBA8 pixels ready for GPU upload.
    Ready {
        size: (u32, u32),
        pixels: Vec<u8>,
    },
    /// The image could not be read; the effect degrades to transparency.
    Failed(PathBuf),
}

/// Spawn the decode thread.
pub fn spawn_loader(rx: Receiver<LoaderMsg>, tx: Sender<LoaderEvent>) {
    thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            match msg {
                LoaderMsg::Quit => break,
                LoaderMsg::Decode(path) => match image::open(&path) {
                    Ok(img) => {
                        let rgba = img.to_rgba8();
                        let size = rgba.dimensions();
                        let _ = tx.send(LoaderEvent::Ready {
                            size,
                            pixels: rgba.into_vec(),
                        });
                    }
                    Err(err) => {
                        warn!(path = %path.display(), %err, "showcase image failed to decode");
                        let _ = tx.send(LoaderEvent::Failed(path));
                    }
                },
            }
        }
    });
}
