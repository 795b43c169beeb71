mod error;
mod fetch;
mod filter;
mod models;
mod ui;
mod utils;

use std::collections::HashMap;
use std::error::Error;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CEvent, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{error, info, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::fetch::{fetch_generation, fetch_pokemon, fetch_sprite, PrefetchState};
use crate::models::{GenerationView, SimplePokemon};
use crate::ui::{draw_ui, App, DetailSlot, SpriteThumb};

const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";
const DEFAULT_GENERATION: u32 = 1;

/// Generation from `--generation N`. Absent, non-numeric or zero values fall
/// back to generation 1 before anything reaches the upstream.
fn generation_from_args(args: &[String]) -> u32 {
    let requested = args
        .iter()
        .position(|a| a == "--generation")
        .and_then(|i| args.get(i + 1));
    match requested {
        None => DEFAULT_GENERATION,
        Some(value) => match value.parse::<u32>() {
            Ok(generation) if generation >= 1 => generation,
            _ => {
                warn!(
                    "invalid generation {:?}, falling back to {}",
                    value, DEFAULT_GENERATION
                );
                DEFAULT_GENERATION
            }
        },
    }
}

/// Refetch a generation in the background; the render loop picks the result
/// up from `slot`. Failures are logged and the current view stays in place.
fn spawn_generation_fetch(
    client: &reqwest::Client,
    base_url: &str,
    generation: u32,
    slot: Arc<Mutex<Option<GenerationView>>>,
) {
    let client = client.clone();
    let base_url = base_url.to_string();
    tokio::spawn(async move {
        match fetch_generation(&client, &base_url, generation).await {
            Ok(pokemon) => {
                let mut slot = slot.lock().unwrap();
                *slot = Some(GenerationView {
                    generation,
                    pokemon,
                });
            }
            Err(e) => error!("generation {} fetch failed: {}", generation, e),
        }
    });
}

/// Fetch one Pokémon's detail in the background and park the outcome in the
/// shared slot the detail pane renders from.
fn spawn_detail_fetch(
    client: &reqwest::Client,
    base_url: &str,
    id: u32,
    slot: Arc<Mutex<DetailSlot>>,
) {
    {
        let mut s = slot.lock().unwrap();
        *s = DetailSlot::Loading(id);
    }
    let client = client.clone();
    let base_url = base_url.to_string();
    tokio::spawn(async move {
        let result = fetch_pokemon(&client, &base_url, id).await;
        let mut s = slot.lock().unwrap();
        *s = match result {
            Ok(detail) => DetailSlot::Ready(detail),
            Err(e) => {
                warn!("detail fetch for {} failed: {}", id, e);
                DetailSlot::Failed(id, e.to_string())
            }
        };
    });
}

/// Download the listing's sprites into the in-memory thumbnail cache,
/// reporting progress through the shared prefetch state. A failed sprite is
/// skipped; the detail pane just shows a placeholder for it.
fn spawn_sprite_prefetch(
    client: &reqwest::Client,
    pokemon: Vec<SimplePokemon>,
    cache: Arc<Mutex<HashMap<u32, SpriteThumb>>>,
    state: Arc<Mutex<PrefetchState>>,
) {
    let client = client.clone();
    tokio::spawn(async move {
        {
            let mut st = state.lock().unwrap();
            st.in_progress = true;
            st.fetched = 0;
            st.total = pokemon.len();
        }
        for p in pokemon {
            let cached = { cache.lock().unwrap().contains_key(&p.id) };
            if !cached {
                match fetch_sprite(&client, &p.image_url).await {
                    Ok(bytes) => {
                        if let Some(thumb) = SpriteThumb::from_png_bytes(&bytes) {
                            cache.lock().unwrap().insert(p.id, thumb);
                        } else {
                            warn!("sprite for {} is not a decodable image", p.id);
                        }
                    }
                    Err(e) => warn!("sprite fetch for {} failed: {}", p.id, e),
                }
            }
            let mut st = state.lock().unwrap();
            st.fetched += 1;
        }
        let mut st = state.lock().unwrap();
        st.in_progress = false;
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let base_url =
        std::env::var("POKEAPI_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let args: Vec<String> = std::env::args().collect();
    let generation = generation_from_args(&args);
    let fetch_only = args.iter().any(|a| a == "--fetch-only");

    // One client for every upstream call; reqwest pools connections behind it.
    let client = reqwest::Client::new();

    info!("fetching generation {} from {}", generation, base_url);
    let pokemon = fetch_generation(&client, &base_url, generation).await?;
    info!("generation {} has {} species", generation, pokemon.len());

    if fetch_only {
        for p in &pokemon {
            println!("#{:<4} {:<12} {}", p.id, p.name, p.image_url);
        }
        return Ok(());
    }

    let mut app = App::new(GenerationView {
        generation,
        pokemon,
    });

    let prefetch_state = Arc::new(Mutex::new(PrefetchState {
        in_progress: false,
        fetched: 0,
        total: 0,
    }));
    app.prefetch_state = Some(prefetch_state.clone());
    spawn_sprite_prefetch(
        &client,
        app.view.pokemon.clone(),
        app.sprite_cache.clone(),
        prefetch_state.clone(),
    );

    // Slot a background generation refetch writes into.
    let refetched: Arc<Mutex<Option<GenerationView>>> = Arc::new(Mutex::new(None));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        draw_ui(&mut terminal, &mut app)?;

        // Pick up a finished background refetch and re-embed its listing.
        if let Some(view) = {
            let mut slot = refetched.lock().unwrap();
            slot.take()
        } {
            app.set_generation(view);
            spawn_sprite_prefetch(
                &client,
                app.view.pokemon.clone(),
                app.sprite_cache.clone(),
                prefetch_state.clone(),
            );
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let CEvent::Key(key) = event::read()? {
                if app.search_mode {
                    match key.code {
                        KeyCode::Enter | KeyCode::Esc => {
                            app.search_mode = false;
                        }
                        KeyCode::Backspace => {
                            app.search_query.pop();
                            app.apply_filter();
                        }
                        KeyCode::Char(c) => {
                            app.search_query.push(c);
                            app.apply_filter();
                        }
                        _ => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Char('/') => {
                            app.search_mode = true;
                            app.search_query.clear();
                            app.apply_filter();
                        }
                        KeyCode::F(1) | KeyCode::Char('h') => {
                            app.show_help = !app.show_help;
                        }
                        KeyCode::Char('s') => {
                            app.show_sprites = !app.show_sprites;
                        }
                        KeyCode::Down => app.next(),
                        KeyCode::Up => app.previous(),
                        KeyCode::Enter => {
                            if let Some(id) = app.selected_pokemon().map(|p| p.id) {
                                spawn_detail_fetch(&client, &base_url, id, app.detail.clone());
                            }
                        }
                        KeyCode::Esc => {
                            let mut slot = app.detail.lock().unwrap();
                            *slot = DetailSlot::Idle;
                        }
                        KeyCode::Left => {
                            if app.view.generation > 1 {
                                spawn_generation_fetch(
                                    &client,
                                    &base_url,
                                    app.view.generation - 1,
                                    refetched.clone(),
                                );
                            }
                        }
                        KeyCode::Right => {
                            spawn_generation_fetch(
                                &client,
                                &base_url,
                                app.view.generation + 1,
                                refetched.clone(),
                            );
                        }
                        KeyCode::Char('r') => {
                            spawn_generation_fetch(
                                &client,
                                &base_url,
                                app.view.generation,
                                refetched.clone(),
                            );
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    disable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn generation_defaults_to_one_when_absent() {
        assert_eq!(generation_from_args(&args(&["pokedex_tui"])), 1);
    }

    #[test]
    fn generation_flag_is_honored() {
        assert_eq!(
            generation_from_args(&args(&["pokedex_tui", "--generation", "3"])),
            3
        );
    }

    #[test]
    fn invalid_generation_falls_back_to_one() {
        assert_eq!(
            generation_from_args(&args(&["pokedex_tui", "--generation", "0"])),
            1
        );
        assert_eq!(
            generation_from_args(&args(&["pokedex_tui", "--generation", "kanto"])),
            1
        );
        assert_eq!(
            generation_from_args(&args(&["pokedex_tui", "--generation"])),
            1
        );
    }
}
