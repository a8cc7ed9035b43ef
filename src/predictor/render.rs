use crate::media::preview::Preview;
use crate::predictor::core::{CameraState, InputMode, LiveLoop, Model, Msg};
use eframe::egui;
use image::RgbaImage;
use std::sync::Arc;

const DROP_ZONE_IDLE: egui::Color32 = egui::Color32::from_rgb(0xf9, 0xfa, 0xfb);
const DROP_ZONE_HOVER: egui::Color32 = egui::Color32::from_rgb(0xe0, 0xf2, 0xfe);
const MEDIA_MAX_HEIGHT: f32 = 360.0;

struct CachedTexture {
    source: Arc<RgbaImage>,
    handle: egui::TextureHandle,
}

/// GPU copies of the preview and webcam images, refreshed when the model
/// points at a different image.
#[derive(Default)]
pub struct Textures {
    preview: Option<CachedTexture>,
    webcam: Option<CachedTexture>,
}

fn color_image(image: &RgbaImage) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied(
        [image.width() as usize, image.height() as usize],
        image.as_raw(),
    )
}

fn texture_for(
    ctx: &egui::Context,
    slot: &mut Option<CachedTexture>,
    name: &str,
    image: &Arc<RgbaImage>,
) -> egui::TextureHandle {
    match slot {
        Some(cached) if Arc::ptr_eq(&cached.source, image) => cached.handle.clone(),
        Some(cached) => {
            cached
                .handle
                .set(color_image(image), egui::TextureOptions::LINEAR);
            cached.source = image.clone();
            cached.handle.clone()
        }
        None => {
            let handle = ctx.load_texture(name, color_image(image), egui::TextureOptions::LINEAR);
            *slot = Some(CachedTexture {
                source: image.clone(),
                handle: handle.clone(),
            });
            handle
        }
    }
}

fn show_texture(ui: &mut egui::Ui, handle: &egui::TextureHandle) {
    ui.add(
        egui::Image::from_texture(egui::load::SizedTexture::from_handle(handle))
            .max_width(ui.available_width())
            .max_height(MEDIA_MAX_HEIGHT),
    );
}

/// Draws the model and returns the messages produced by user interaction.
pub fn render(ctx: &egui::Context, model: &Model, textures: &mut Textures) -> Vec<Msg> {
    let mut msgs = Vec::new();

    egui::TopBottomPanel::top("mode_tabs").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui
                .selectable_label(model.mode == InputMode::Upload, "Upload")
                .clicked()
            {
                msgs.push(Msg::SelectMode(InputMode::Upload));
            }
            if ui
                .selectable_label(model.mode == InputMode::Live, "Live webcam")
                .clicked()
            {
                msgs.push(Msg::SelectMode(InputMode::Live));
            }
        });
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(12.0);

            match model.mode {
                InputMode::Upload => render_upload(ctx, ui, model, textures, &mut msgs),
                InputMode::Live => render_live(ctx, ui, model, textures),
            }

            ui.add_space(16.0);
            render_predict_button(ui, model, &mut msgs);

            ui.add_space(16.0);
            render_result(ui, model);
        });
    });

    if let Some(alert) = &model.alert {
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(alert);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    msgs.push(Msg::DismissAlert);
                }
            });
    }

    msgs
}

fn render_upload(
    ctx: &egui::Context,
    ui: &mut egui::Ui,
    model: &Model,
    textures: &mut Textures,
    msgs: &mut Vec<Msg>,
) {
    let fill = if model.drop_zone_hovered {
        DROP_ZONE_HOVER
    } else {
        DROP_ZONE_IDLE
    };

    let drop_zone = egui::Frame::none()
        .fill(fill)
        .stroke(egui::Stroke::new(1.5, egui::Color32::GRAY))
        .rounding(8.0)
        .inner_margin(24.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                egui::RichText::new("Drag & drop an image or video here, or click to browse")
                    .color(egui::Color32::DARK_GRAY),
            );
        });

    if drop_zone
        .response
        .interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand)
        .clicked()
    {
        msgs.push(Msg::BrowseRequested);
    }

    if let Some(file) = &model.selected {
        ui.add_space(8.0);
        ui.label(format!("{} ({})", file.name, file.mime));
    }

    match &model.preview {
        Preview::None => {
            textures.preview = None;
        }
        Preview::Image(image) => {
            ui.add_space(8.0);
            let handle = texture_for(ctx, &mut textures.preview, "preview", image);
            show_texture(ui, &handle);
        }
        Preview::Video {
            name,
            size_bytes,
            path,
        } => {
            textures.preview = None;
            ui.add_space(8.0);
            ui.group(|ui| {
                ui.label(egui::RichText::new(name).strong());
                ui.label(format!("Video, {:.1} MB", *size_bytes as f64 / 1_048_576.0));
                if ui
                    .add_enabled(path.is_some(), egui::Button::new("Play"))
                    .clicked()
                {
                    msgs.push(Msg::PlayVideo);
                }
            });
        }
    }
}

fn render_live(ctx: &egui::Context, ui: &mut egui::Ui, model: &Model, textures: &mut Textures) {
    match model.camera {
        CameraState::Off => {
            textures.webcam = None;
            ui.label("Camera off");
        }
        CameraState::Starting => {
            ui.label("Requesting camera access...");
            ui.spinner();
        }
        CameraState::Denied => {
            textures.webcam = None;
            ui.label("Camera unavailable");
        }
        CameraState::Streaming => match &model.webcam_frame {
            Some(frame) => {
                let handle = texture_for(ctx, &mut textures.webcam, "webcam", frame);
                show_texture(ui, &handle);
            }
            None => {
                ui.label("Waiting for the first frame...");
            }
        },
    }
}

fn render_predict_button(ui: &mut egui::Ui, model: &Model, msgs: &mut Vec<Msg>) {
    let live_running = matches!(model.live, LiveLoop::Running { .. });

    let text = match model.mode {
        InputMode::Upload => "Predict",
        InputMode::Live if live_running => "Predicting live...",
        InputMode::Live => "Start live prediction",
    };

    let enabled = !model.loading && !(model.mode == InputMode::Live && live_running);

    if ui
        .add_enabled(enabled, egui::Button::new(text).min_size(egui::vec2(160.0, 32.0)))
        .clicked()
    {
        msgs.push(Msg::PredictPressed);
    }

    if model.loading {
        ui.add_space(8.0);
        ui.spinner();
    }
}

fn render_result(ui: &mut egui::Ui, model: &Model) {
    ui.label(egui::RichText::new("Prediction").weak());
    ui.label(egui::RichText::new(model.label.text()).size(32.0).strong());
    if let Some(confidence) = model.confidence {
        ui.label(egui::RichText::new(format!("confidence {:.2}", confidence)).small());
    }
}
