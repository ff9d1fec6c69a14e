//! The timeline canvas: header bands, grid, today line, phase-colored entry
//! bars, lane-stacked groups, drag/resize handling and pan/zoom gestures.
//!
//! All geometry comes out of the engine; this module only paints it and
//! feeds abstract pointer data back in.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use egui::{Color32, Id, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use uuid::Uuid;

use crate::engine::drag::{DragReschedule, GrabKind, ReleaseOutcome};
use crate::engine::kinetic::KineticPan;
use crate::engine::lanes::{pack_lanes, LaneInterval, LaneLayout};
use crate::engine::phases::derive_phases;
use crate::engine::{axis, header};
use crate::model::{EntryKind, TimelineEntry, Viewport};
use crate::ui::theme;

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const LANE_HEIGHT: f32 = theme::LANE_HEIGHT;
const ROW_GAP: f32 = theme::ROW_GAP;
const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;

/// Entries closer than this share no lane; half a day keeps back-to-back
/// service visits visually separated.
const LANE_MIN_GAP_HOURS: i64 = 12;

/// A finished reschedule gesture, to be pushed through the commit path.
#[derive(Debug, Clone, Copy)]
pub struct CommitRequest {
    pub id: Uuid,
    pub new_start: NaiveDate,
    pub new_end: NaiveDate,
    pub prev_start: NaiveDate,
    pub prev_end: NaiveDate,
}

/// What the canvas wants the app to do after this frame.
#[derive(Debug, Default)]
pub struct TimelineInteraction {
    /// Entry clicked (not dragged): navigation/selection intent.
    pub activated: Option<Uuid>,
    pub commit: Option<CommitRequest>,
    pub clear_selection: bool,
}

/// What one visual row contains.
#[derive(Debug)]
enum RowContent {
    /// A top-level entry bar (project, or an orphan production order).
    Single(Uuid),
    /// Lane-packed group: production orders under one project, or the
    /// collapsed service row.
    Group {
        members: Vec<Uuid>,
        layout: LaneLayout,
    },
}

#[derive(Debug)]
struct Row {
    top: f32,
    height: f32,
    content: RowContent,
}

/// Lay out the visible rows: each top-level entry gets a row, an expanded
/// project is followed by a lane-packed band of its production orders, and
/// all service visits share one lane-packed group at the bottom.
fn build_rows(entries: &[TimelineEntry], collapsed: &HashSet<Uuid>) -> Vec<Row> {
    let gap = Duration::hours(LANE_MIN_GAP_HOURS);
    let mut rows = Vec::new();
    let mut top = HEADER_HEIGHT + ROW_GAP;

    let mut push = |content: RowContent, height: f32| {
        rows.push(Row {
            top,
            height,
            content,
        });
        top += height + ROW_GAP;
    };

    for entry in entries {
        if entry.kind == EntryKind::Service || entry.parent_id.is_some() {
            continue;
        }
        push(RowContent::Single(entry.id), ROW_HEIGHT);

        if collapsed.contains(&entry.id) {
            continue;
        }
        let children: Vec<&TimelineEntry> = entries
            .iter()
            .filter(|e| e.parent_id == Some(entry.id))
            .collect();
        if children.is_empty() {
            continue;
        }
        let layout = pack_lanes(
            &children
                .iter()
                .map(|e| LaneInterval {
                    id: e.id,
                    start: e.start,
                    end: Some(e.end),
                })
                .collect::<Vec<_>>(),
            gap,
        );
        let height = layout.lane_count as f32 * (LANE_HEIGHT + ROW_GAP);
        push(
            RowContent::Group {
                members: children.iter().map(|e| e.id).collect(),
                layout,
            },
            height,
        );
    }

    let services: Vec<&TimelineEntry> = entries
        .iter()
        .filter(|e| e.kind == EntryKind::Service)
        .collect();
    if !services.is_empty() {
        let layout = pack_lanes(
            &services
                .iter()
                .map(|e| LaneInterval {
                    id: e.id,
                    start: e.start,
                    end: Some(e.end),
                })
                .collect::<Vec<_>>(),
            gap,
        );
        let height = layout.lane_count as f32 * (LANE_HEIGHT + ROW_GAP);
        push(
            RowContent::Group {
                members: services.iter().map(|e| e.id).collect(),
                layout,
            },
            height,
        );
    }

    rows
}

fn total_height(rows: &[Row]) -> f32 {
    rows.last()
        .map(|r| r.top + r.height + 40.0)
        .unwrap_or(HEADER_HEIGHT + 40.0)
}

/// Render the timeline and process every gesture for this frame.
#[allow(clippy::too_many_arguments)]
pub fn show_timeline(
    entries: &[TimelineEntry],
    viewport: &mut Viewport,
    pan: &mut KineticPan,
    drag: &mut DragReschedule,
    selected: Option<Uuid>,
    collapsed: &HashSet<Uuid>,
    ui: &mut Ui,
) -> TimelineInteraction {
    let mut interaction = TimelineInteraction::default();
    let available = ui.available_size();
    let rows = build_rows(entries, collapsed);
    let canvas_height = total_height(&rows).max(available.y);

    // Ctrl+wheel zooms around the cursor; the engine keeps the date under it
    // anchored.
    let (scroll_delta, ctrl_held, pointer) = ui.input(|i| {
        (
            i.smooth_scroll_delta,
            i.modifiers.ctrl,
            i.pointer.hover_pos(),
        )
    });

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) =
                ui.allocate_painter(Vec2::new(available.x, canvas_height), Sense::click_and_drag());
            let rect = response.rect;

            if ui.rect_contains_pointer(rect) && ctrl_held && scroll_delta.y != 0.0 {
                let focal = pointer.map(|p| p.x - rect.left()).unwrap_or(rect.width() / 2.0);
                viewport.zoom_by((scroll_delta.y * 0.002).exp(), focal);
            } else if ui.rect_contains_pointer(rect) && scroll_delta.x != 0.0 {
                // Horizontal wheel/trackpad pans directly.
                viewport.scroll_px -= scroll_delta.x;
            }

            painter.rect_filled(rect, 0.0, theme::BG_DARK);

            let x_of = |date: NaiveDate, view: &Viewport| {
                rect.left() + axis::date_to_offset(date, view) - view.scroll_px
            };

            let (range_start, range_end) = viewport.visible_range(rect.width());
            let bands = header::header_bands(range_start, range_end, viewport.day_width);

            draw_grid(&painter, rect, viewport, &bands, &x_of);

            // Preview dates for the entry under an active drag, from the
            // latest pointer position.
            let preview = pointer.and_then(|p| {
                drag.active_entry()
                    .zip(drag.preview(p.x, viewport.day_width))
            });
            let display_dates = |entry: &TimelineEntry| match preview {
                Some((id, dates)) if id == entry.id => dates,
                _ => (entry.start, entry.end),
            };

            let mut consumed_click = false;
            for row in &rows {
                match &row.content {
                    RowContent::Single(id) => {
                        if let Some(entry) = entries.iter().find(|e| e.id == *id) {
                            let (start, end) = display_dates(entry);
                            let bar = bar_rect(rect, row.top, ROW_HEIGHT, start, end, viewport, &x_of);
                            draw_entry_bar(&painter, entry, bar, viewport.day_width, selected == Some(entry.id));
                            draw_milestone_marks(&painter, entry, bar, viewport, &x_of);
                            interact_bar(ui, entry, bar, viewport, pan, drag, &mut interaction, &mut consumed_click);
                        }
                    }
                    RowContent::Group { members, layout } => {
                        for id in members {
                            let Some(entry) = entries.iter().find(|e| e.id == *id) else {
                                continue;
                            };
                            let lane = layout.lane_of(*id);
                            let lane_top = row.top + lane as f32 * (LANE_HEIGHT + ROW_GAP);
                            let (start, end) = display_dates(entry);
                            let bar =
                                bar_rect(rect, lane_top, LANE_HEIGHT, start, end, viewport, &x_of);
                            draw_entry_bar(&painter, entry, bar, viewport.day_width, selected == Some(entry.id));
                            interact_bar(ui, entry, bar, viewport, pan, drag, &mut interaction, &mut consumed_click);
                        }
                    }
                }
            }

            draw_header(&painter, rect, viewport, &bands, &x_of);
            draw_today_line(&painter, rect, canvas_height, viewport, &x_of);

            handle_pan(ui, &response, pan, drag, viewport);

            if response.clicked() && !consumed_click {
                interaction.clear_selection = true;
            }
        });

    // Keep the coast animation alive between frames.
    if pan.is_coasting() {
        let dt = ui.input(|i| i.stable_dt).min(0.1);
        pan.tick(dt, viewport);
        ui.ctx().request_repaint();
    }

    interaction
}

/// Background drag scrolls the view; releasing with speed coasts. A live bar
/// gesture owns the pointer, so panning is locked out while one is active.
fn handle_pan(
    ui: &Ui,
    response: &egui::Response,
    pan: &mut KineticPan,
    drag: &DragReschedule,
    viewport: &mut Viewport,
) {
    if drag.is_active() {
        pan.stop();
        return;
    }
    let now = ui.input(|i| i.time);
    let pointer_x = response
        .interact_pointer_pos()
        .map(|p| p.x)
        .unwrap_or_default();
    if response.drag_started() {
        pan.begin_drag(pointer_x, now, viewport);
    } else if response.dragged() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        pan.drag_to(pointer_x, now, viewport);
    } else if response.drag_stopped() {
        pan.release();
        if pan.is_coasting() {
            ui.ctx().request_repaint();
        }
    }
}

fn bar_rect(
    rect: Rect,
    top: f32,
    row_height: f32,
    start: NaiveDate,
    end: NaiveDate,
    viewport: &Viewport,
    x_of: &impl Fn(NaiveDate, &Viewport) -> f32,
) -> Rect {
    let x = x_of(start, viewport);
    let width = axis::width_for_interval(start, end, viewport);
    Rect::from_min_size(
        Pos2::new(x, rect.top() + top + theme::BAR_INSET),
        Vec2::new(width, row_height - theme::BAR_INSET * 2.0),
    )
}

/// Wire one bar's pointer handling into the drag controller and translate
/// the release outcome into an interaction for the app.
#[allow(clippy::too_many_arguments)]
fn interact_bar(
    ui: &mut Ui,
    entry: &TimelineEntry,
    bar: Rect,
    viewport: &Viewport,
    pan: &mut KineticPan,
    drag: &mut DragReschedule,
    interaction: &mut TimelineInteraction,
    consumed_click: &mut bool,
) {
    let body = ui.interact(
        bar,
        ui.make_persistent_id(("entry-bar", entry.id)),
        Sense::click_and_drag(),
    );
    let left = ui.interact(
        handle_zone(bar, true),
        ui.make_persistent_id(("entry-resize-left", entry.id)),
        Sense::drag(),
    );
    let right = ui.interact(
        handle_zone(bar, false),
        ui.make_persistent_id(("entry-resize-right", entry.id)),
        Sense::drag(),
    );

    let grab = if left.drag_started() {
        Some((GrabKind::ResizeStart, &left))
    } else if right.drag_started() {
        Some((GrabKind::ResizeEnd, &right))
    } else if body.drag_started() {
        Some((GrabKind::Move, &body))
    } else {
        None
    };
    if let Some((kind, response)) = grab {
        // Bar gestures and panning are mutually exclusive per viewport.
        pan.stop();
        let x = response.interact_pointer_pos().map(|p| p.x).unwrap_or(bar.left());
        drag.begin(entry.id, kind, x, entry.start, entry.end);
    }

    if drag.active_entry() == Some(entry.id) {
        let cursor = if left.dragged() || right.dragged() {
            egui::CursorIcon::ResizeHorizontal
        } else {
            egui::CursorIcon::Grabbing
        };
        ui.ctx().set_cursor_icon(cursor);

        if body.drag_stopped() || left.drag_stopped() || right.drag_stopped() {
            let x = ui
                .input(|i| i.pointer.latest_pos())
                .map(|p| p.x)
                .unwrap_or(bar.left());
            match drag.release(x, viewport.day_width) {
                ReleaseOutcome::Commit {
                    entry_id,
                    new_start,
                    new_end,
                    prev_start,
                    prev_end,
                } => {
                    interaction.commit = Some(CommitRequest {
                        id: entry_id,
                        new_start,
                        new_end,
                        prev_start,
                        prev_end,
                    });
                    *consumed_click = true;
                }
                ReleaseOutcome::Click { entry_id } => {
                    interaction.activated = Some(entry_id);
                    *consumed_click = true;
                }
                ReleaseOutcome::Unchanged => {}
            }
        }
    }

    if body.clicked() {
        interaction.activated = Some(entry.id);
        *consumed_click = true;
    }

    if left.hovered() || right.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
        draw_handles(ui.painter(), bar);
    } else if body.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    if body.hovered() || left.hovered() || right.hovered() {
        egui::show_tooltip_at_pointer(
            ui.ctx(),
            ui.layer_id(),
            Id::new(("entry-tip", entry.id)),
            |ui| {
                ui.strong(&entry.title);
                ui.label(format!(
                    "{} → {}",
                    entry.start.format("%d/%m/%Y"),
                    entry.end.format("%d/%m/%Y"),
                ));
                for phase in derive_phases(entry) {
                    ui.label(
                        egui::RichText::new(format!(
                            "{}: {} → {}",
                            phase.label.name(),
                            phase.start.format("%d/%m"),
                            phase.end.format("%d/%m"),
                        ))
                        .size(10.5)
                        .color(theme::phase_color(phase.label)),
                    );
                }
            },
        );
    }
}

fn handle_zone(bar: Rect, left: bool) -> Rect {
    let x = if left { bar.left() } else { bar.right() };
    Rect::from_min_max(
        Pos2::new(x - HANDLE_WIDTH * 0.5, bar.top()),
        Pos2::new(x + HANDLE_WIDTH * 0.5, bar.bottom()),
    )
    .expand2(Vec2::new(2.0, 0.0))
}

fn draw_handles(painter: &egui::Painter, bar: Rect) {
    let handle_h = bar.height() * 0.55;
    let handle_y = bar.center().y - handle_h / 2.0;
    for x in [bar.left() - 1.5, bar.right() - 2.5] {
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(x, handle_y), Vec2::new(4.0, handle_h)),
            Rounding::same(2.0),
            theme::HANDLE_COLOR,
        );
    }
}

/// Draw one entry bar: a base bar in the kind color with the derived phase
/// segments overlaid on the same pixel grid.
fn draw_entry_bar(
    painter: &egui::Painter,
    entry: &TimelineEntry,
    bar: Rect,
    day_width: f32,
    is_selected: bool,
) {
    let rounding = Rounding::same(theme::BAR_ROUNDING);
    let base = theme::kind_color(entry.kind);

    painter.rect_filled(bar.translate(Vec2::new(1.0, 2.0)), rounding, Color32::from_black_alpha(35));
    painter.rect_filled(bar, rounding, base.gamma_multiply(0.45));

    // Phase segments are positioned relative to the bar's left edge on the
    // shared day grid, so they ride along with a move preview.
    let clipped = painter.with_clip_rect(bar);
    for phase in derive_phases(entry) {
        let offset = (phase.start - entry.start).num_days() as f32 * day_width;
        let width = ((phase.end - phase.start).num_days().max(1) as f32) * day_width;
        let seg = Rect::from_min_size(
            Pos2::new(bar.left() + offset, bar.top()),
            Vec2::new(width, bar.height()),
        );
        clipped.rect_filled(seg, Rounding::ZERO, theme::phase_color(phase.label));
    }

    if is_selected {
        painter.rect_stroke(
            bar.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    if bar.width() > 30.0 {
        let galley = painter.layout_no_wrap(
            entry.title.clone(),
            theme::font_bar(),
            theme::TEXT_ON_BAR,
        );
        let text_y = bar.top() + (bar.height() - galley.size().y) / 2.0;
        clipped.galley(Pos2::new(bar.left() + 6.0, text_y), galley, Color32::TRANSPARENT);
    }
}

/// Diamond marks for each milestone date the entry actually has.
fn draw_milestone_marks(
    painter: &egui::Painter,
    entry: &TimelineEntry,
    bar: Rect,
    viewport: &Viewport,
    x_of: &impl Fn(NaiveDate, &Viewport) -> f32,
) {
    let size = (bar.height() * 0.35).max(4.0);
    for date in entry.milestones.iter() {
        let x = x_of(date, viewport);
        let center = Pos2::new(x, bar.center().y);
        let points = vec![
            Pos2::new(center.x, center.y - size),
            Pos2::new(center.x + size, center.y),
            Pos2::new(center.x, center.y + size),
            Pos2::new(center.x - size, center.y),
        ];
        painter.add(egui::Shape::convex_polygon(
            points,
            theme::MILESTONE_COLOR,
            Stroke::new(1.0, theme::BG_DARK),
        ));
    }
}

fn draw_grid(
    painter: &egui::Painter,
    rect: Rect,
    viewport: &Viewport,
    bands: &header::HeaderBands,
    x_of: &impl Fn(NaiveDate, &Viewport) -> f32,
) {
    // Weekend shading only makes sense when day cells are visible.
    for cell in &bands.days {
        if cell.weekend {
            let x = x_of(cell.date, viewport);
            painter.rect_filled(
                Rect::from_min_max(
                    Pos2::new(x, rect.top() + HEADER_HEIGHT),
                    Pos2::new(x + viewport.day_width, rect.bottom()),
                ),
                0.0,
                theme::BG_WEEKEND,
            );
        }
    }

    // Vertical lines on week starts, or day starts when zoomed in.
    let line_dates: Vec<NaiveDate> = if bands.days.is_empty() {
        bands.weeks.iter().map(|b| b.start).collect()
    } else {
        bands.days.iter().map(|c| c.date).collect()
    };
    for date in line_dates {
        let x = x_of(date, viewport);
        painter.line_segment(
            [
                Pos2::new(x, rect.top() + HEADER_HEIGHT),
                Pos2::new(x, rect.bottom()),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );
    }
}

fn draw_header(
    painter: &egui::Painter,
    rect: Rect,
    viewport: &Viewport,
    bands: &header::HeaderBands,
    x_of: &impl Fn(NaiveDate, &Viewport) -> f32,
) {
    painter.rect_filled(
        Rect::from_min_size(rect.min, Vec2::new(rect.width(), HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(rect.left(), rect.top() + HEADER_HEIGHT),
            Pos2::new(rect.right(), rect.top() + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    // Every band width is day-count × day-width, the same arithmetic the
    // bars use, so the rows cannot drift apart.
    for band in &bands.months {
        let x = x_of(band.start, viewport);
        painter.text(
            Pos2::new(x + 4.0, rect.top() + 10.0),
            egui::Align2::LEFT_CENTER,
            &band.label,
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
        painter.line_segment(
            [
                Pos2::new(x, rect.top()),
                Pos2::new(x, rect.top() + HEADER_HEIGHT),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );
    }

    for band in &bands.weeks {
        let x = x_of(band.start, viewport);
        let width = band.days as f32 * viewport.day_width;
        if width > 24.0 {
            painter.text(
                Pos2::new(x + 3.0, rect.top() + 26.0),
                egui::Align2::LEFT_CENTER,
                &band.label,
                theme::font_sub(),
                theme::TEXT_SECONDARY,
            );
        }
    }

    for cell in &bands.days {
        let x = x_of(cell.date, viewport);
        let color = if cell.weekend {
            theme::TEXT_DIM
        } else {
            theme::TEXT_SECONDARY
        };
        let label = match &cell.name {
            Some(name) => format!("{} {}", name, cell.label),
            None => cell.label.clone(),
        };
        painter.text(
            Pos2::new(x + 3.0, rect.top() + 42.0),
            egui::Align2::LEFT_CENTER,
            label,
            theme::font_sub(),
            color,
        );
    }
}

fn draw_today_line(
    painter: &egui::Painter,
    rect: Rect,
    height: f32,
    viewport: &Viewport,
    x_of: &impl Fn(NaiveDate, &Viewport) -> f32,
) {
    let today = chrono::Local::now().date_naive();
    let x = x_of(today, viewport);
    painter.line_segment(
        [
            Pos2::new(x, rect.top() + HEADER_HEIGHT),
            Pos2::new(x, rect.top() + height),
        ],
        Stroke::new(1.5, theme::TODAY_LINE),
    );

    let badge_w = 42.0;
    let badge = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, rect.top() + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::sample_fleet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn service_entries_collapse_into_one_group_row() {
        let entries = sample_fleet();
        let rows = build_rows(&entries, &HashSet::new());
        let groups: Vec<_> = rows
            .iter()
            .filter_map(|r| match &r.content {
                RowContent::Group { members, layout } => Some((members.len(), layout.lane_count)),
                _ => None,
            })
            .collect();
        // One production band under the expanded project, one service group.
        assert_eq!(groups.len(), 2);
        let (service_members, service_lanes) = groups[groups.len() - 1];
        assert_eq!(service_members, 3);
        // Two of the sample visits overlap, so at least two lanes.
        assert!(service_lanes >= 2);
    }

    #[test]
    fn collapsing_a_project_hides_its_production_band() {
        let entries = sample_fleet();
        let project = entries
            .iter()
            .find(|e| e.kind == EntryKind::Project)
            .unwrap()
            .id;
        let expanded = build_rows(&entries, &HashSet::new()).len();
        let collapsed = build_rows(&entries, &HashSet::from([project])).len();
        assert_eq!(collapsed, expanded - 1);
    }

    #[test]
    fn group_row_height_scales_with_lane_count() {
        let mut a = TimelineEntry::new(EntryKind::Service, "A", d(2024, 1, 1), d(2024, 1, 3));
        let mut b = TimelineEntry::new(EntryKind::Service, "B", d(2024, 1, 2), d(2024, 1, 4));
        a.milestones.service_end = Some(a.end);
        b.milestones.service_end = Some(b.end);
        let rows = build_rows(&[a, b], &HashSet::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].height, 2.0 * (LANE_HEIGHT + ROW_GAP));
    }

    #[test]
    fn rows_are_stacked_without_overlap() {
        let entries = sample_fleet();
        let rows = build_rows(&entries, &HashSet::new());
        for pair in rows.windows(2) {
            assert!(pair[1].top >= pair[0].top + pair[0].height);
        }
    }
}
