use crate::config::Config;
use crate::predictor::core::{DroppedMedia, Msg};
use crate::predictor::main::MediaPredictor;
use crate::predictor::render::{render, Textures};
use eframe::egui;
use std::time::Duration;

pub struct PredictorApp {
    predictor: MediaPredictor,
    textures: Textures,
    repaint_interval: Duration,
    files_hovered: bool,
}

impl PredictorApp {
    pub fn new(predictor: MediaPredictor, repaint_interval: Duration) -> Self {
        Self {
            predictor,
            textures: Textures::default(),
            repaint_interval,
            files_hovered: false,
        }
    }
}

impl eframe::App for PredictorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.predictor.pump();

        let (hovered, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.clone(),
            )
        });

        if hovered != self.files_hovered {
            self.files_hovered = hovered;
            self.predictor.dispatch(Msg::DropZoneHovered(hovered));
        }

        // Only the first of several dropped files is used.
        if let Some(file) = dropped.into_iter().next() {
            self.predictor
                .dispatch(Msg::FileDropped(dropped_media(file)));
        }

        for msg in render(ctx, self.predictor.model(), &mut self.textures) {
            self.predictor.dispatch(msg);
        }

        // Effects report back from other threads, so keep polling.
        ctx.request_repaint_after(self.repaint_interval);
    }
}

fn dropped_media(file: egui::DroppedFile) -> DroppedMedia {
    let name = if file.name.is_empty() {
        file.path
            .as_ref()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        file.name
    };

    DroppedMedia {
        name,
        mime: None,
        path: file.path,
        bytes: file.bytes,
    }
}

pub fn run(config: &Config, predictor: MediaPredictor) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Media Predict")
            .with_inner_size([520.0, 760.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let repaint_interval = config.tick_rate;

    eframe::run_native(
        "Media Predict",
        options,
        Box::new(move |_cc| Box::new(PredictorApp::new(predictor, repaint_interval))),
    )
}
