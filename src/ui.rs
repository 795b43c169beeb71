//! Terminal presentation: generation listing and search on the left, the
//! selected Pokémon's detail pane on the right.
//!
//! The search box does not filter `view.pokemon` directly. The view embeds
//! its listing as a serialized token and every keystroke round-trips that
//! token through `decode_listing` + `filter_by_name`, the same path an
//! external filter action would take.

use std::collections::HashMap;
use std::io;
use std::io::Stdout;
use std::sync::{Arc, Mutex};

use image::imageops::FilterType;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;

use crate::fetch::PrefetchState;
use crate::filter::{decode_listing, encode_listing, filter_by_name};
use crate::models::{GenerationView, PokemonDetail, SimplePokemon};
use crate::utils::capitalize;

/// Side length of cached sprite thumbnails; display sizes resize from this.
pub const THUMB_SIZE: u32 = 48;

/// Compact RGB thumbnail kept in the in-memory sprite cache.
pub struct SpriteThumb {
    pub w: u32,
    pub h: u32,
    /// RGB pixels in row-major order (len = w*h*3)
    pub pixels: Vec<u8>,
}

impl SpriteThumb {
    /// Decode downloaded PNG bytes into a canonical-size thumbnail.
    pub fn from_png_bytes(bytes: &[u8]) -> Option<Self> {
        let img = image::load_from_memory(bytes).ok()?;
        let small = image::imageops::resize(
            &img.to_rgba8(),
            THUMB_SIZE,
            THUMB_SIZE,
            FilterType::Lanczos3,
        );
        let mut pixels = Vec::with_capacity((THUMB_SIZE * THUMB_SIZE * 3) as usize);
        for y in 0..small.height() {
            for x in 0..small.width() {
                let p = small.get_pixel(x, y);
                pixels.push(p[0]);
                pixels.push(p[1]);
                pixels.push(p[2]);
            }
        }
        Some(SpriteThumb {
            w: THUMB_SIZE,
            h: THUMB_SIZE,
            pixels,
        })
    }
}

/// Outcome slot for the on-demand detail fetch. A background task writes it,
/// the render loop reads it.
pub enum DetailSlot {
    Idle,
    Loading(u32),
    Ready(PokemonDetail),
    Failed(u32, String),
}

pub struct App {
    pub view: GenerationView,
    /// Serialized listing embedded in the view; the filter path reads this,
    /// never `view.pokemon` directly.
    pub token: String,
    pub visible: Vec<SimplePokemon>,
    pub selected: usize,
    pub search_mode: bool,
    pub search_query: String,
    pub show_sprites: bool,
    pub show_help: bool,
    pub detail: Arc<Mutex<DetailSlot>>,
    pub prefetch_state: Option<Arc<Mutex<PrefetchState>>>,
    // Shared with the background prefetch task, which fills it without
    // blocking the render loop.
    pub sprite_cache: Arc<Mutex<HashMap<u32, SpriteThumb>>>,
}

impl App {
    pub fn new(view: GenerationView) -> Self {
        let token = encode_listing(&view.pokemon);
        let mut app = Self {
            view,
            token,
            visible: Vec::new(),
            selected: 0,
            search_mode: false,
            search_query: String::new(),
            show_sprites: true,
            show_help: false,
            detail: Arc::new(Mutex::new(DetailSlot::Idle)),
            prefetch_state: None,
            sprite_cache: Arc::new(Mutex::new(HashMap::new())),
        };
        app.apply_filter();
        app
    }

    /// Swap in a freshly fetched generation and re-embed its token.
    pub fn set_generation(&mut self, view: GenerationView) {
        self.token = encode_listing(&view.pokemon);
        self.view = view;
        self.selected = 0;
        self.apply_filter();
    }

    /// Recompute the visible subset by round-tripping the embedded token
    /// through the filter, exactly as the filter action would.
    pub fn apply_filter(&mut self) {
        self.visible = filter_by_name(
            decode_listing(&self.token),
            Some(self.search_query.as_str()),
        );
        if self.visible.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.visible.len() {
            self.selected = self.visible.len() - 1;
        }
    }

    pub fn selected_pokemon(&self) -> Option<&SimplePokemon> {
        self.visible.get(self.selected)
    }

    pub fn next(&mut self) {
        if !self.visible.is_empty() {
            self.selected = (self.selected + 1) % self.visible.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.visible.is_empty() {
            if self.selected == 0 {
                self.selected = self.visible.len() - 1;
            } else {
                self.selected -= 1;
            }
        }
    }

    /// Pixel rows for `id` at `w` x `h`, or None while the sprite is still
    /// being prefetched. A size mismatch resizes in memory from the cached
    /// thumbnail rather than re-downloading.
    pub fn get_sprite_pixels(&self, id: u32, w: u32, h: u32) -> Option<Vec<Vec<(u8, u8, u8)>>> {
        let cache = self.sprite_cache.lock().unwrap();
        let thumb = cache.get(&id)?;

        if thumb.w == w && thumb.h == h {
            let mut rows: Vec<Vec<(u8, u8, u8)>> = Vec::with_capacity(h as usize);
            for y in 0..h {
                let mut row = Vec::with_capacity(w as usize);
                let row_start = (y * w * 3) as usize;
                for x in 0..w {
                    let idx = row_start + (x as usize) * 3;
                    row.push((thumb.pixels[idx], thumb.pixels[idx + 1], thumb.pixels[idx + 2]));
                }
                rows.push(row);
            }
            return Some(rows);
        }

        let mut buf = image::RgbaImage::new(thumb.w, thumb.h);
        for y in 0..thumb.h {
            for x in 0..thumb.w {
                let idx = ((y * thumb.w + x) * 3) as usize;
                buf.put_pixel(
                    x,
                    y,
                    image::Rgba([
                        thumb.pixels[idx],
                        thumb.pixels[idx + 1],
                        thumb.pixels[idx + 2],
                        255,
                    ]),
                );
            }
        }
        let resized = image::imageops::resize(&buf, w, h, FilterType::Lanczos3);
        let mut rows: Vec<Vec<(u8, u8, u8)>> = Vec::with_capacity(resized.height() as usize);
        for y in 0..resized.height() {
            let mut row = Vec::with_capacity(resized.width() as usize);
            for x in 0..resized.width() {
                let p = resized.get_pixel(x, y);
                row.push((p[0], p[1], p[2]));
            }
            rows.push(row);
        }
        Some(rows)
    }
}

/// Canonical badge color for a (lowercase) type name.
fn type_color(name: &str) -> Color {
    let (r, g, b) = match name {
        "normal" => (168, 168, 120),
        "fire" => (240, 128, 48),
        "water" => (104, 144, 240),
        "grass" => (120, 200, 80),
        "electric" => (248, 208, 48),
        "ice" => (152, 216, 216),
        "fighting" => (192, 48, 40),
        "poison" => (160, 64, 160),
        "ground" => (224, 192, 104),
        "flying" => (168, 144, 240),
        "psychic" => (248, 88, 136),
        "bug" => (168, 184, 32),
        "rock" => (184, 160, 56),
        "ghost" => (112, 88, 152),
        "dragon" => (112, 56, 248),
        "dark" => (112, 88, 72),
        "steel" => (184, 184, 208),
        "fairy" => (238, 153, 172),
        _ => (200, 200, 200),
    };
    Color::Rgb(r, g, b)
}

pub fn draw_ui(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    terminal
        .draw(|f| {
            fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
                let popup_w = r.width.saturating_mul(percent_x) / 100;
                let popup_h = r.height.saturating_mul(percent_y) / 100;
                let popup_x = r.x + (r.width.saturating_sub(popup_w) / 2);
                let popup_y = r.y + (r.height.saturating_sub(popup_h) / 2);
                Rect::new(popup_x, popup_y, popup_w, popup_h)
            }

            let size = f.size();
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
                .split(size);

            let left_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(3), Constraint::Length(3)])
                .split(chunks[0]);

            let items: Vec<ListItem> = app
                .visible
                .iter()
                .map(|p| {
                    ListItem::new(vec![Spans::from(vec![Span::raw(format!(
                        "#{} {}",
                        p.id, p.name
                    ))])])
                })
                .collect();

            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("Generation {}", app.view.generation)),
                )
                .highlight_style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                );

            f.render_stateful_widget(list, left_chunks[0], &mut {
                let mut state = ratatui::widgets::ListState::default();
                if !app.visible.is_empty() {
                    state.select(Some(app.selected));
                }
                state
            });

            // The bottom-left box doubles as the sprite-prefetch gauge while
            // the background task is running, then becomes the search box.
            let prefetching = app
                .prefetch_state
                .as_ref()
                .map(|state| {
                    let st = state.lock().unwrap();
                    if st.in_progress {
                        Some((st.fetched, st.total))
                    } else {
                        None
                    }
                })
                .unwrap_or(None);

            if let Some((fetched, total)) = prefetching {
                let pct = if total == 0 {
                    0.0
                } else {
                    fetched as f64 / total as f64
                };
                let gauge = Gauge::default()
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title("Fetching sprites"),
                    )
                    .gauge_style(Style::default().fg(Color::Green))
                    .ratio(pct);
                f.render_widget(gauge, left_chunks[1]);
            } else {
                let search_para = if app.search_mode {
                    Paragraph::new(vec![Spans::from(Span::raw(format!(
                        "/{}",
                        app.search_query
                    )))])
                    .block(Block::default().borders(Borders::ALL).title("Search"))
                } else {
                    Paragraph::new(vec![Spans::from(Span::raw(
                        "Press '/' to search by name.",
                    ))])
                    .block(Block::default().borders(Borders::ALL).title("Search"))
                };
                f.render_widget(search_para, left_chunks[1]);
            }

            if let Some(selected) = app.selected_pokemon().cloned() {
                let detail_chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(14), Constraint::Min(5)])
                    .split(chunks[1]);

                let top_chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Length(26), Constraint::Min(10)])
                    .split(detail_chunks[0]);

                let sprite_para = if app.show_sprites {
                    let rect = top_chunks[0];
                    let avail_w = if rect.width > 2 { (rect.width - 2) as u32 } else { 1 };
                    let avail_h = if rect.height > 2 { (rect.height - 2) as u32 } else { 1 };
                    let sprite_w = std::cmp::min(avail_w, THUMB_SIZE);
                    let sprite_h = std::cmp::min(avail_h, THUMB_SIZE);

                    if let Some(rows) = app.get_sprite_pixels(selected.id, sprite_w, sprite_h) {
                        let mut stext: Vec<Spans> = Vec::new();
                        for row in rows.iter() {
                            let mut spans = Vec::new();
                            for &(r, g, b) in row.iter() {
                                spans.push(Span::styled(
                                    " ",
                                    Style::default().bg(Color::Rgb(r, g, b)),
                                ));
                            }
                            stext.push(Spans::from(spans));
                        }
                        Paragraph::new(stext)
                            .block(Block::default().borders(Borders::ALL).title("Sprite"))
                    } else {
                        Paragraph::new("(sprite not fetched yet)")
                            .block(Block::default().borders(Borders::ALL).title("Sprite"))
                    }
                } else {
                    Paragraph::new("(sprites off)")
                        .block(Block::default().borders(Borders::ALL).title("Sprite"))
                };
                f.render_widget(sprite_para, top_chunks[0]);

                let mut summary_lines: Vec<Spans> = Vec::new();
                summary_lines.push(Spans::from(Span::styled(
                    format!("{} (#{})", selected.name, selected.id),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                summary_lines.push(Spans::from(Span::raw(format!(
                    "Sprite: {}",
                    selected.image_url
                ))));
                let summary_para = Paragraph::new(summary_lines)
                    .block(Block::default().borders(Borders::ALL).title("Info"))
                    .wrap(Wrap { trim: true });
                f.render_widget(summary_para, top_chunks[1]);

                let slot = app.detail.lock().unwrap();
                let mut entry_lines: Vec<Spans> = Vec::new();
                match &*slot {
                    DetailSlot::Ready(detail) if detail.id == selected.id => {
                        entry_lines.push(Spans::from(Span::styled(
                            format!("Pokédex entry: {}", detail.name),
                            Style::default().add_modifier(Modifier::BOLD),
                        )));
                        let mut type_spans: Vec<Span> = vec![Span::raw("Types: ")];
                        for t in detail.types.iter() {
                            type_spans.push(Span::styled(
                                format!(" {} ", capitalize(t)),
                                Style::default().fg(Color::Black).bg(type_color(t)),
                            ));
                            type_spans.push(Span::raw(" "));
                        }
                        entry_lines.push(Spans::from(type_spans));
                        entry_lines.push(Spans::from(Span::raw(format!(
                            "Height: {:.1} m ({} dm)",
                            detail.height as f32 / 10.0,
                            detail.height
                        ))));
                        entry_lines.push(Spans::from(Span::raw(format!(
                            "Weight: {:.1} kg ({} hg)",
                            detail.weight as f32 / 10.0,
                            detail.weight
                        ))));
                    }
                    DetailSlot::Loading(id) if *id == selected.id => {
                        entry_lines.push(Spans::from(Span::raw(format!(
                            "Fetching entry #{}...",
                            id
                        ))));
                    }
                    DetailSlot::Failed(id, message) if *id == selected.id => {
                        entry_lines.push(Spans::from(Span::styled(
                            format!("Couldn't fetch entry: {}", message),
                            Style::default().fg(Color::Red),
                        )));
                        entry_lines.push(Spans::from(Span::raw("Press Enter to retry.")));
                    }
                    _ => {
                        entry_lines.push(Spans::from(Span::raw(
                            "Press Enter to fetch the Pokédex entry.",
                        )));
                    }
                }
                let entry_para = Paragraph::new(entry_lines)
                    .block(Block::default().borders(Borders::ALL).title("Details"))
                    .wrap(Wrap { trim: true });
                f.render_widget(entry_para, detail_chunks[1]);
            } else {
                let empty_para = Paragraph::new("No Pokémon match the filter")
                    .block(Block::default().borders(Borders::ALL).title("Details"));
                f.render_widget(empty_para, chunks[1]);
            }

            if app.show_help {
                let popup = centered_rect(60, 50, size);
                let mut help_lines: Vec<Spans> = Vec::new();
                help_lines.push(Spans::from(Span::styled(
                    "Keybindings",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                help_lines.push(Spans::from(Span::raw("")));
                help_lines.push(Spans::from(Span::raw("q          Quit")));
                help_lines.push(Spans::from(Span::raw("/          Enter search mode")));
                help_lines.push(Spans::from(Span::raw(
                    "Enter/Esc  Finish or cancel search mode",
                )));
                help_lines.push(Spans::from(Span::raw("Up/Down    Navigate list")));
                help_lines.push(Spans::from(Span::raw(
                    "Left/Right Previous or next generation",
                )));
                help_lines.push(Spans::from(Span::raw("Enter      Fetch Pokédex entry")));
                help_lines.push(Spans::from(Span::raw("r          Refetch this generation")));
                help_lines.push(Spans::from(Span::raw("s          Toggle sprites")));
                help_lines.push(Spans::from(Span::raw("h          Toggle this help")));

                let help_para = Paragraph::new(help_lines)
                    .block(Block::default().borders(Borders::ALL).title("Help"))
                    .wrap(Wrap { trim: true });
                f.render_widget(help_para, popup);
            }
        })
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sprite_url;

    fn kanto_starters() -> GenerationView {
        let pokemon = [(1, "Bulbasaur"), (2, "Ivysaur"), (3, "Venusaur")]
            .iter()
            .map(|&(id, name)| SimplePokemon {
                id,
                name: name.to_string(),
                image_url: sprite_url(id),
            })
            .collect();
        GenerationView {
            generation: 1,
            pokemon,
        }
    }

    #[test]
    fn search_round_trips_through_the_embedded_token() {
        let mut app = App::new(kanto_starters());
        assert_eq!(app.visible.len(), 3);

        app.search_query = "ivy".to_string();
        app.apply_filter();
        assert_eq!(app.visible.len(), 1);
        assert_eq!(app.visible[0].name, "Ivysaur");
    }

    #[test]
    fn clearing_the_query_restores_the_full_listing() {
        let mut app = App::new(kanto_starters());
        app.search_query = "ZZZ".to_string();
        app.apply_filter();
        assert!(app.visible.is_empty());

        app.search_query.clear();
        app.apply_filter();
        assert_eq!(app.visible.len(), 3);
    }

    #[test]
    fn garbled_token_degrades_to_an_empty_listing() {
        let mut app = App::new(kanto_starters());
        app.token = "definitely not a token".to_string();
        app.apply_filter();
        assert!(app.visible.is_empty());
    }

    #[test]
    fn selection_is_clamped_when_the_filter_shrinks_the_listing() {
        let mut app = App::new(kanto_starters());
        app.selected = 2;
        app.search_query = "ivy".to_string();
        app.apply_filter();
        assert_eq!(app.selected, 0);
        assert_eq!(app.selected_pokemon().map(|p| p.id), Some(2));
    }

    #[test]
    fn set_generation_re_embeds_the_token() {
        let mut app = App::new(kanto_starters());
        let johto = GenerationView {
            generation: 2,
            pokemon: vec![SimplePokemon {
                id: 152,
                name: "Chikorita".to_string(),
                image_url: sprite_url(152),
            }],
        };
        app.set_generation(johto);
        assert_eq!(app.visible.len(), 1);
        assert_eq!(app.visible[0].id, 152);
        assert!(decode_listing(&app.token).len() == 1);
    }
}
