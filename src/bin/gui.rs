#[cfg(feature = "gui")]
use cowwy::PipelineParams;
#[cfg(feature = "gui")]
use cowwy::gui::{CowwyGui, init_logging};
#[cfg(feature = "gui")]
use eframe::{NativeOptions, egui::ViewportBuilder};

#[cfg(feature = "gui")]
fn main() -> Result<(), eframe::Error> {
    // Installed before the model loads so start-up failures reach the log panel
    init_logging();

    let options = NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Cowwy background remover",
        options,
        Box::new(|_cc| Ok(Box::new(CowwyGui::new(PipelineParams::default())))),
    )
}

#[cfg(not(feature = "gui"))]
fn main() {
    eprintln!("GUI feature is not enabled. Please build with --features gui");
    std::process::exit(1);
}
