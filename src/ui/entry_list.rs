use std::collections::HashSet;

use egui::{Color32, RichText, Ui};
use uuid::Uuid;

use crate::model::{EntryKind, TimelineEntry};
use crate::ui::theme;

/// Actions the entry list can request.
pub enum EntryListAction {
    None,
    Select(Uuid),
    ToggleCollapse(Uuid),
}

/// Render the left-side entry list: top-level entries with their production
/// orders indented underneath, expand/collapse per project, service visits
/// grouped at the bottom. Mirrors the row structure of the canvas.
pub fn show_entry_list(
    entries: &[TimelineEntry],
    selected: Option<Uuid>,
    collapsed: &HashSet<Uuid>,
    ui: &mut Ui,
) -> EntryListAction {
    let mut action = EntryListAction::None;

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Fleet")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!("({})", entries.len()))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
    });
    ui.add_space(4.0);
    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for entry in entries {
                if entry.parent_id.is_some() || entry.kind == EntryKind::Service {
                    continue;
                }
                let children: Vec<&TimelineEntry> = entries
                    .iter()
                    .filter(|e| e.parent_id == Some(entry.id))
                    .collect();
                let is_open = !collapsed.contains(&entry.id);

                row(ui, entry, selected, 0.0, &mut action);
                if !children.is_empty() {
                    let marker = if is_open { "▾" } else { "▸" };
                    let toggle = ui.add(
                        egui::Button::new(
                            RichText::new(format!(
                                "{marker} {} production orders",
                                children.len()
                            ))
                            .size(10.0)
                            .color(theme::TEXT_DIM),
                        )
                        .frame(false),
                    );
                    if toggle.clicked() {
                        action = EntryListAction::ToggleCollapse(entry.id);
                    }
                    if is_open {
                        for child in children {
                            row(ui, child, selected, 14.0, &mut action);
                        }
                    }
                }
            }

            let services: Vec<&TimelineEntry> = entries
                .iter()
                .filter(|e| e.kind == EntryKind::Service)
                .collect();
            if !services.is_empty() {
                ui.add_space(6.0);
                ui.label(
                    RichText::new("SERVICE")
                        .size(9.0)
                        .strong()
                        .color(theme::TEXT_DIM),
                );
                for entry in services {
                    row(ui, entry, selected, 0.0, &mut action);
                }
            }
        });

    action
}

fn row(
    ui: &mut Ui,
    entry: &TimelineEntry,
    selected: Option<Uuid>,
    indent: f32,
    action: &mut EntryListAction,
) {
    let is_selected = selected == Some(entry.id);
    let row_bg = if is_selected {
        theme::BG_SELECTED
    } else {
        Color32::TRANSPARENT
    };

    let frame = egui::Frame {
        fill: row_bg,
        rounding: egui::Rounding::same(4.0),
        inner_margin: egui::Margin::symmetric(6.0, 4.0),
        outer_margin: egui::Margin::ZERO,
        stroke: egui::Stroke::NONE,
        shadow: egui::epaint::Shadow::NONE,
    };

    let frame_resp = frame.show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.add_space(indent);
            ui.spacing_mut().item_spacing.x = 6.0;

            let (dot_rect, _) = ui.allocate_exact_size(egui::vec2(6.0, 6.0), egui::Sense::hover());
            ui.painter()
                .circle_filled(dot_rect.center(), 3.0, theme::kind_color(entry.kind));

            let text = RichText::new(&entry.title).size(12.0).color(if is_selected {
                Color32::WHITE
            } else {
                theme::TEXT_PRIMARY
            });
            ui.add(egui::Label::new(text).truncate());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(entry.end.format("%d/%m").to_string())
                        .size(10.0)
                        .color(theme::TEXT_SECONDARY),
                );
                ui.label(RichText::new("→").size(9.0).color(theme::TEXT_DIM));
                ui.label(
                    RichText::new(entry.start.format("%d/%m").to_string())
                        .size(10.0)
                        .color(theme::TEXT_SECONDARY),
                );
            });
        });
    });

    let click = ui.interact(
        frame_resp.response.rect,
        egui::Id::new(("entry-row", entry.id)),
        egui::Sense::click(),
    );
    if click.clicked() {
        *action = EntryListAction::Select(entry.id);
    }
    ui.add_space(1.0);
}
