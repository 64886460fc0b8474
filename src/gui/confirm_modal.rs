use eframe::egui;

/// Yes/no prompt for destructive actions. `Some(true)` once confirmed,
/// `Some(false)` once dismissed, `None` while still open.
pub fn show(ctx: &egui::Context, message: &str, danger: egui::Color32) -> Option<bool> {
    let mut answer = None;

    let modal = egui::Modal::new(egui::Id::new("confirm_modal")).show(ctx, |ui| {
        ui.set_width(360.0);
        ui.label(egui::RichText::new(message).size(16.0));
        ui.add_space(15.0);

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let delete = egui::Button::new(egui::RichText::new("Delete").color(egui::Color32::WHITE))
                .fill(danger);
            if ui.add(delete).clicked() {
                answer = Some(true);
            }
            if ui.button("Cancel").clicked() {
                answer = Some(false);
            }
        });
    });

    if answer.is_none() && modal.should_close() {
        answer = Some(false);
    }
    answer
}
