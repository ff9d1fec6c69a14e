use std::collections::HashSet;

use log::{error, info};
use uuid::Uuid;

use crate::data::{commit_reschedule, merge_refresh, EntryStore, JsonStore};
use crate::engine::drag::DragReschedule;
use crate::engine::kinetic::KineticPan;
use crate::model::{TimelineEntry, Viewport};
use crate::ui;

/// Main application state: the store, the working entry copy, and the
/// engine controllers for the single timeline viewport.
pub struct TimelineApp {
    store: JsonStore,
    /// Working copy of the entry set; the store stays the source of truth.
    entries: Vec<TimelineEntry>,
    pub viewport: Viewport,
    pan: KineticPan,
    drag: DragReschedule,

    pub selected: Option<Uuid>,
    pub collapsed: HashSet<Uuid>,
    pub search_query: String,
    pub status_message: String,

    /// Canvas width of the previous frame, for center-focal toolbar zoom.
    canvas_width: f32,
}

impl TimelineApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icons as a font fallback for the toolbar glyphs.
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let store = JsonStore::sample();
        let entries = store.list_entries().unwrap_or_default();
        let viewport = Self::initial_viewport(&entries);

        Self {
            store,
            entries,
            viewport,
            pan: KineticPan::default(),
            drag: DragReschedule::default(),
            selected: None,
            collapsed: HashSet::new(),
            search_query: String::new(),
            status_message: "Ready".to_string(),
            canvas_width: 1000.0,
        }
    }

    fn initial_viewport(entries: &[TimelineEntry]) -> Viewport {
        let today = chrono::Local::now().date_naive();
        let origin = entries
            .iter()
            .map(|e| e.start)
            .min()
            .unwrap_or(today)
            - chrono::Duration::days(7);
        let mut viewport = Viewport::new(origin);
        viewport.scroll_to_date(today, 260.0);
        viewport
    }

    // --- Store operations ---

    pub fn open_store(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Fleet Timeline", &["fleet.json", "json"])
            .pick_file()
        {
            match JsonStore::load(path) {
                Ok(store) => {
                    self.store = store;
                    self.entries = self.store.list_entries().unwrap_or_default();
                    self.viewport = Self::initial_viewport(&self.entries);
                    self.selected = None;
                    self.collapsed.clear();
                    self.status_message = format!("Loaded {} entries", self.entries.len());
                }
                Err(e) => {
                    error!("open failed: {e}");
                    self.status_message = format!("Error loading: {e}");
                }
            }
        }
    }

    pub fn save_store_as(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Fleet Timeline", &["fleet.json", "json"])
            .set_file_name("fleet.json")
            .save_file()
        {
            match self.store.save_as(path) {
                Ok(()) => self.status_message = "Entries saved".to_string(),
                Err(e) => {
                    error!("save failed: {e}");
                    self.status_message = format!("Error saving: {e}");
                }
            }
        }
    }

    /// Pull a fresh snapshot from the store. An entry with a gesture in
    /// flight keeps its local preview dates until the gesture resolves.
    pub fn refresh_entries(&mut self) {
        match self.store.list_entries() {
            Ok(fresh) => {
                merge_refresh(&mut self.entries, fresh, self.drag.active_entry());
                self.status_message = "Entries reloaded".to_string();
            }
            Err(e) => {
                error!("refresh failed: {e}");
                self.status_message = format!("Error reloading: {e}");
            }
        }
    }

    pub fn store_path_label(&self) -> Option<String> {
        self.store
            .path()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    // --- View operations ---

    pub fn zoom_step(&mut self, factor: f32) {
        self.viewport.zoom_by(factor, self.canvas_width / 2.0);
    }

    pub fn jump_to_today(&mut self) {
        let today = chrono::Local::now().date_naive();
        self.viewport.scroll_to_date(today, self.canvas_width / 4.0);
    }

    /// The entry set the engine sees: narrowed by the search box before any
    /// packing or rendering happens. A match keeps its parent and children
    /// so the row structure stays intact.
    fn filtered_entries(&self) -> Vec<TimelineEntry> {
        let query = self.search_query.trim().to_lowercase();
        if query.is_empty() {
            return self.entries.clone();
        }
        let direct: HashSet<Uuid> = self
            .entries
            .iter()
            .filter(|e| e.title.to_lowercase().contains(&query))
            .map(|e| e.id)
            .collect();
        self.entries
            .iter()
            .filter(|e| {
                direct.contains(&e.id)
                    || e.parent_id.is_some_and(|p| direct.contains(&p))
                    || self
                        .entries
                        .iter()
                        .any(|c| c.parent_id == Some(e.id) && direct.contains(&c.id))
            })
            .cloned()
            .collect()
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);

        let zoom_in = ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::Plus));
        let zoom_out = ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::Minus));
        let go_today = ctx.input(|i| i.key_pressed(egui::Key::Home));
        if zoom_in {
            self.zoom_step(1.25);
        }
        if zoom_out {
            self.zoom_step(0.8);
        }
        if go_today {
            self.jump_to_today();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(10.5)
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("Entries: {}", self.entries.len()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        ui.label(
                            egui::RichText::new(" · ")
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        ui.label(
                            egui::RichText::new(format!(
                                "Zoom: {:.1} px/day",
                                self.viewport.day_width
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        let visible = self.filtered_entries();

        let mut list_action = ui::entry_list::EntryListAction::None;
        egui::SidePanel::left("entry_panel")
            .default_width(260.0)
            .min_width(180.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(8.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                list_action =
                    ui::entry_list::show_entry_list(&visible, self.selected, &self.collapsed, ui);
            });

        match list_action {
            ui::entry_list::EntryListAction::Select(id) => self.selected = Some(id),
            ui::entry_list::EntryListAction::ToggleCollapse(id) => {
                if !self.collapsed.remove(&id) {
                    self.collapsed.insert(id);
                }
            }
            ui::entry_list::EntryListAction::None => {}
        }

        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            self.canvas_width = ui.available_width();
            let interaction = ui::timeline::show_timeline(
                &visible,
                &mut self.viewport,
                &mut self.pan,
                &mut self.drag,
                self.selected,
                &self.collapsed,
                ui,
            );

            if let Some(id) = interaction.activated {
                self.selected = Some(id);
                if let Some(entry) = self.entries.iter().find(|e| e.id == id) {
                    self.status_message = format!("Selected '{}'", entry.title);
                }
            }
            if interaction.clear_selection {
                self.selected = None;
            }
            if let Some(req) = interaction.commit {
                match commit_reschedule(
                    &mut self.store,
                    &mut self.entries,
                    req.id,
                    req.new_start,
                    req.new_end,
                    req.prev_start,
                    req.prev_end,
                ) {
                    Ok(()) => {
                        let title = self
                            .entries
                            .iter()
                            .find(|e| e.id == req.id)
                            .map(|e| e.title.as_str())
                            .unwrap_or("entry");
                        info!("rescheduled {} to {} → {}", req.id, req.new_start, req.new_end);
                        self.status_message = format!(
                            "Rescheduled '{}' ({} → {})",
                            title, req.new_start, req.new_end
                        );
                    }
                    Err(e) => {
                        // The working copy is already rolled back; tell the
                        // user why the bar snapped home.
                        self.status_message = format!("Reschedule failed: {e}");
                    }
                }
            }
        });
    }
}
