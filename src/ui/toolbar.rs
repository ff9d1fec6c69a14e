use egui::{menu, RichText, Ui};

use crate::app::TimelineApp;
use crate::model::ZoomPreset;
use crate::ui::theme;

/// Render the top toolbar: menus, zoom controls, search and the phase
/// legend. Everything here is a thin caller into the app/engine operations.
pub fn show_toolbar(app: &mut TimelineApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button("  Open...").clicked() {
                app.open_store();
                ui.close_menu();
            }
            if ui.button("  Save As...").clicked() {
                app.save_store_as();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Reload Entries").clicked() {
                app.refresh_entries();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            if ui.button("  Zoom In        Ctrl+Scroll ↑").clicked() {
                app.zoom_step(1.25);
                ui.close_menu();
            }
            if ui.button("  Zoom Out      Ctrl+Scroll ↓").clicked() {
                app.zoom_step(0.8);
                ui.close_menu();
            }
            if ui.button("  Jump to Today").clicked() {
                app.jump_to_today();
                ui.close_menu();
            }
            ui.separator();
            ui.label(RichText::new("Scale Presets").small().weak());
            for preset in [ZoomPreset::Day, ZoomPreset::Week, ZoomPreset::Month] {
                let active = (app.viewport.day_width - preset.day_width()).abs() < 0.01;
                if ui.radio(active, preset.label()).clicked() {
                    app.viewport.zoom_to_preset(preset);
                    ui.close_menu();
                }
            }
        });

        ui.separator();
        ui.label(RichText::new("🔎").size(12.0));
        let search = egui::TextEdit::singleline(&mut app.search_query)
            .hint_text("Filter entries...")
            .desired_width(160.0);
        ui.add(search);

        // Phase legend, right-aligned with the source file name.
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let source = app
                .store_path_label()
                .unwrap_or_else(|| "sample fleet (unsaved)".to_string());
            ui.label(RichText::new(source).size(11.0).weak());
            ui.separator();
            for &label in theme::LEGEND_PHASES.iter().rev() {
                ui.label(
                    RichText::new(label.name())
                        .size(10.0)
                        .color(theme::TEXT_SECONDARY),
                );
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(rect, egui::Rounding::same(2.0), theme::phase_color(label));
            }
        });
    });
}
