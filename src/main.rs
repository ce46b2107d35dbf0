//! Brick Wager entry point
//!
//! Handles platform-specific initialization and drives the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{Document, HtmlButtonElement, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use brick_wager::consts::*;
    use brick_wager::platform::direction_for_key;
    use brick_wager::renderer::{RenderState, Renderer};
    use brick_wager::round::Wei;
    use brick_wager::sim::{FrameState, RoundOutcome};
    use brick_wager::{
        FrameHandle, GameLoop, LedgerClient, LedgerError, PlayMode, PlayerStats,
        QualityPreset, RoundController, RoundSummary, Settings,
    };

    // Ledger bridge installed by the page as `window.brickLedger`.
    // Every call resolves once the wallet/provider call is confirmed.
    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(catch, js_namespace = brickLedger, js_name = entryFee)]
        async fn js_entry_fee() -> Result<JsValue, JsValue>;
        #[wasm_bindgen(catch, js_namespace = brickLedger, js_name = winReward)]
        async fn js_win_reward() -> Result<JsValue, JsValue>;
        #[wasm_bindgen(catch, js_namespace = brickLedger, js_name = balance)]
        async fn js_balance() -> Result<JsValue, JsValue>;
        #[wasm_bindgen(catch, js_namespace = brickLedger, js_name = startGame)]
        async fn js_start_game(entry_fee: String) -> Result<JsValue, JsValue>;
        #[wasm_bindgen(catch, js_namespace = brickLedger, js_name = winGame)]
        async fn js_win_game() -> Result<JsValue, JsValue>;
        #[wasm_bindgen(catch, js_namespace = brickLedger, js_name = loseGame)]
        async fn js_lose_game() -> Result<JsValue, JsValue>;
        #[wasm_bindgen(catch, js_namespace = brickLedger, js_name = playerStats)]
        async fn js_player_stats() -> Result<JsValue, JsValue>;
    }

    /// Ledger client backed by the page's JS bridge
    struct JsLedger;

    fn provider_error(err: JsValue) -> LedgerError {
        let message = err
            .dyn_ref::<js_sys::Error>()
            .map(|e| String::from(e.message()))
            .or_else(|| err.as_string())
            .unwrap_or_else(|| format!("{:?}", err));
        LedgerError::from_provider_message(&message)
    }

    fn wei_from(value: JsValue) -> Result<Wei, LedgerError> {
        let text = value
            .as_string()
            .ok_or_else(|| LedgerError::Provider("amount is not a string".into()))?;
        Wei::try_from(text).map_err(|e| LedgerError::Provider(format!("bad amount: {}", e)))
    }

    /// Transactions resolve to `true` when the receipt reports success
    fn confirmed(value: JsValue) -> Result<(), LedgerError> {
        if value.as_bool() == Some(false) {
            Err(LedgerError::TransactionFailed)
        } else {
            Ok(())
        }
    }

    impl LedgerClient for JsLedger {
        async fn entry_fee(&self) -> Result<Wei, LedgerError> {
            wei_from(js_entry_fee().await.map_err(provider_error)?)
        }

        async fn win_reward(&self) -> Result<Wei, LedgerError> {
            wei_from(js_win_reward().await.map_err(provider_error)?)
        }

        async fn balance(&self) -> Result<Wei, LedgerError> {
            wei_from(js_balance().await.map_err(provider_error)?)
        }

        async fn start_round(&self, entry_fee: Wei) -> Result<(), LedgerError> {
            confirmed(js_start_game(entry_fee.into()).await.map_err(provider_error)?)
        }

        async fn report_win(&self) -> Result<(), LedgerError> {
            confirmed(js_win_game().await.map_err(provider_error)?)
        }

        async fn report_loss(&self) -> Result<(), LedgerError> {
            confirmed(js_lose_game().await.map_err(provider_error)?)
        }

        async fn player_stats(&self) -> Result<PlayerStats, LedgerError> {
            let json = js_player_stats()
                .await
                .map_err(provider_error)?
                .as_string()
                .ok_or_else(|| LedgerError::Provider("stats are not a string".into()))?;
            serde_json::from_str(&json)
                .map_err(|e| LedgerError::Provider(format!("bad stats: {}", e)))
        }
    }

    type Controller = RoundController<JsLedger>;

    /// Game instance holding all state
    struct App {
        game: GameLoop,
        render_state: Option<RenderState>,
        settings: Settings,
    }

    fn dom() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn set_disabled(document: &Document, id: &str, disabled: bool) {
        if let Some(btn) = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok())
        {
            btn.set_disabled(disabled);
        }
    }

    /// Update HUD elements in DOM
    fn update_hud(state: &FrameState, settings: &Settings) {
        let Some(document) = dom() else {
            return;
        };

        set_text(&document, "hud-score", &state.score.score.to_string());
        set_text(&document, "hud-lives", &state.score.lives.to_string());

        // Only show when 2+ for an actual combo
        let combo = state.score.combo;
        set_visible(&document, "hud-combo", combo > 1);
        if combo > 1 {
            set_text(&document, "hud-combo-value", &format!("{combo}x COMBO"));
        }
        let best = state.score.max_combo;
        set_visible(&document, "hud-best", settings.show_best_combo && best > 1);
        set_text(&document, "hud-best-value", &best.to_string());

        // Floating indicators, positioned in field percent
        if let Some(layer) = document.get_element_by_id("indicators") {
            let html: String = state
                .indicators
                .iter()
                .map(|i| {
                    let pos = i.display_pos();
                    let [r, g, b] = i.tint.rgb();
                    format!(
                        "<span class=\"indicator\" style=\"left:{:.2}%;top:{:.2}%;opacity:{:.3};color:rgb({},{},{})\">{}</span>",
                        pos.x / FIELD_WIDTH * 100.0,
                        pos.y / FIELD_HEIGHT * 100.0,
                        i.life.max(0.0),
                        (r * 255.0) as u8,
                        (g * 255.0) as u8,
                        (b * 255.0) as u8,
                        i.text
                    )
                })
                .collect();
            layer.set_inner_html(&html);
        }
    }

    /// Stats, fee/reward line, error banner and button states
    fn update_ledger_panel(controller: &Controller, round_running: bool) {
        let Some(document) = dom() else {
            return;
        };
        let stats = controller.stats();
        set_text(&document, "stat-wins", &stats.wins.to_string());
        set_text(&document, "stat-games", &stats.games_played.to_string());
        set_text(&document, "stat-earnings", &stats.total_earnings.to_string());
        set_text(
            &document,
            "fee-line",
            &format!(
                "Entry Fee: {} | Win Reward: {}",
                controller.entry_fee(),
                controller.win_reward()
            ),
        );

        match controller.last_error() {
            Some(e) => {
                set_text(&document, "error", &e.to_string());
                set_visible(&document, "error", true);
            }
            None => set_visible(&document, "error", false),
        }

        set_disabled(
            &document,
            "start-paid-btn",
            round_running || !controller.can_start_paid(),
        );
        set_disabled(&document, "free-play-btn", round_running || controller.is_busy());
        set_disabled(&document, "stop-btn", !round_running);
        set_text(
            &document,
            "start-paid-btn",
            if controller.is_busy() {
                "Starting..."
            } else {
                "Start New Game (Pay Entry Fee)"
            },
        );
    }

    fn show_result(summary: &RoundSummary, controller: &Controller) {
        let Some(document) = dom() else {
            return;
        };
        let text = match (summary.outcome, controller.mode()) {
            (RoundOutcome::Win, PlayMode::Paid) => {
                format!("You Won! You earned {}", controller.win_reward())
            }
            (RoundOutcome::Win, _) => "You Won!".to_string(),
            _ => format!("Game Over. Final score: {}", summary.score),
        };
        set_text(&document, "result", &text);
        set_visible(&document, "result", true);
    }

    fn is_running(app: &Rc<RefCell<App>>) -> bool {
        app.borrow().game.is_active()
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let frame_app = app.clone();
        let closure = Closure::once(move |time: f64| {
            on_frame(frame_app, time);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(id) => app.borrow_mut().game.frame_scheduled(FrameHandle(id)),
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn on_frame(app: Rc<RefCell<App>>, time: f64) {
        let step = {
            let mut guard = app.borrow_mut();
            let App {
                game,
                render_state,
                settings,
            } = &mut *guard;
            let renderer = render_state.as_mut().map(|r| r as &mut dyn Renderer);
            let step = game.frame(time, renderer);
            update_hud(game.state(), settings);
            step
        };

        if step.reschedule() {
            request_animation_frame(app);
        }
    }

    fn start_round(app: &Rc<RefCell<App>>, controller: &Controller) {
        let seed = js_sys::Date::now() as u64;
        let started = app.borrow_mut().game.start(seed);
        if started {
            if let Some(document) = dom() {
                set_visible(&document, "result", false);
            }
            update_ledger_panel(controller, true);
            request_animation_frame(app.clone());
        }
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {}", e).into());
        }

        log::info!("Brick Wager starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        // Fixed logical field, scaled for the display
        let dpr = window.device_pixel_ratio();
        let width = (FIELD_WIDTH as f64 * dpr) as u32;
        let height = (FIELD_HEIGHT as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let app = Rc::new(RefCell::new(App {
            game: GameLoop::new(&settings),
            render_state: None,
            settings,
        }));
        let controller: Controller = RoundController::new(JsLedger);

        // Terminal outcomes go to the ledger, at most once per round
        {
            let controller = controller.clone();
            let listener_app = app.clone();
            app.borrow_mut().game.set_outcome_listener(move |summary| {
                show_result(summary, &controller);
                update_ledger_panel(&controller, false);
                if let Some(report) = controller.settle(summary) {
                    let controller = controller.clone();
                    let app = listener_app.clone();
                    spawn_local(async move {
                        if let Err(e) = report.await {
                            log::warn!("Outcome report failed: {}", e);
                        }
                        update_ledger_panel(&controller, is_running(&app));
                    });
                }
            });
        }

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = {
            let settings = app.borrow().settings.clone();
            RenderState::new(surface, &adapter, width, height, &settings)
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        {
            let mut guard = app.borrow_mut();
            let App {
                game,
                render_state: slot,
                settings,
            } = &mut *guard;
            let render_state = slot.insert(render_state);
            // Idle board
            game.redraw(render_state);
            update_hud(game.state(), settings);
        }

        setup_input_handlers(app.clone())?;
        setup_buttons(app.clone(), controller.clone())?;

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        update_ledger_panel(&controller, false);
        let connect = controller.clone();
        spawn_local(async move {
            if let Err(e) = connect.connect().await {
                log::warn!("Ledger connect failed: {}", e);
            }
            update_ledger_panel(&connect, false);
        });

        log::info!("Brick Wager running!");
        Ok(())
    }

    fn setup_input_handlers(app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        for (event_name, held) in [("keydown", true), ("keyup", false)] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(direction) = direction_for_key(&event.key()) {
                    event.prevent_default();
                    app.borrow_mut().game.input_mut().set(direction, held);
                }
            });
            window.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Drop held keys when the window loses focus
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().game.input_mut().clear();
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn on_click(
        document: &Document,
        id: &str,
        handler: impl FnMut(MouseEvent) + 'static,
    ) -> Result<(), JsValue> {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(handler);
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        } else {
            log::warn!("Missing button #{}", id);
        }
        Ok(())
    }

    fn setup_buttons(app: Rc<RefCell<App>>, controller: Controller) -> Result<(), JsValue> {
        let document = dom().ok_or("no document")?;

        // Paid round: entry fee first, loop only after confirmation
        {
            let app = app.clone();
            let controller = controller.clone();
            on_click(&document, "start-paid-btn", move |_| {
                if is_running(&app) {
                    return;
                }
                // Busy from here on; free play stays disabled until it resolves
                let pending = controller.begin_paid_round();
                update_ledger_panel(&controller, false);
                let app = app.clone();
                let controller = controller.clone();
                spawn_local(async move {
                    match pending.await {
                        Ok(()) => start_round(&app, &controller),
                        Err(e) => {
                            log::warn!("Paid round not started: {}", e);
                            update_ledger_panel(&controller, false);
                        }
                    }
                });
            })?;
        }

        {
            let app = app.clone();
            let controller = controller.clone();
            on_click(&document, "free-play-btn", move |_| {
                if is_running(&app) {
                    return;
                }
                match controller.begin_free_play() {
                    Ok(()) => start_round(&app, &controller),
                    Err(e) => {
                        log::warn!("Free play not started: {}", e);
                        update_ledger_panel(&controller, false);
                    }
                }
            })?;
        }

        // Stop only cancels the loop; nothing goes to the ledger
        {
            let app = app.clone();
            let controller = controller.clone();
            on_click(&document, "stop-btn", move |_| {
                let handle = app.borrow_mut().game.stop();
                if let (Some(FrameHandle(id)), Some(window)) = (handle, web_sys::window()) {
                    let _ = window.cancel_animation_frame(id);
                }
                update_ledger_panel(&controller, false);
            })?;
        }

        // Cycle quality presets and persist
        {
            let app = app.clone();
            on_click(&document, "quality-btn", move |_| {
                let mut guard = app.borrow_mut();
                let App {
                    game,
                    render_state,
                    settings,
                } = &mut *guard;
                let next = match settings.quality {
                    QualityPreset::Low => QualityPreset::Medium,
                    QualityPreset::Medium => QualityPreset::High,
                    QualityPreset::High => QualityPreset::Low,
                };
                settings.apply_preset(next);
                settings.save();
                game.apply_settings(settings);
                if let Some(render_state) = render_state.as_mut() {
                    render_state.apply_settings(settings);
                    if !game.is_active() {
                        game.redraw(render_state);
                    }
                }
                if let Some(document) = dom() {
                    set_text(&document, "quality-btn", &format!("Quality: {}", next.as_str()));
                }
                log::info!("Quality set to {}", next.as_str());
            })?;
        }

        {
            let controller = controller.clone();
            on_click(&document, "error", move |_| {
                controller.clear_error();
                update_ledger_panel(&controller, is_running(&app));
            })?;
        }

        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Brick Wager (native) starting...");
    log::info!("Native mode runs a headless autopilot round - use `trunk serve` for the web version");

    match autopilot::play(std::env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(1)) {
        Some(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Could not encode summary: {}", e),
        },
        None => log::warn!("Round did not finish within the frame limit"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless round with a paddle that chases the ball
#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use brick_wager::renderer::HeadlessRenderer;
    use brick_wager::sim::Direction;
    use brick_wager::{FrameStep, GameLoop, RoundSummary, Settings};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Ten minutes of play
    const MAX_FRAMES: u64 = 60 * 60 * 10;
    /// Dead zone around the paddle center
    const SLACK: f32 = 6.0;

    pub fn play(seed: u64) -> Option<RoundSummary> {
        let settings = Settings::default();
        let mut game = GameLoop::new(&settings);
        let mut renderer = HeadlessRenderer::new(&settings);
        game.set_outcome_listener(|summary| {
            log::info!("Outcome: {:?} after {} ticks", summary.outcome, summary.ticks);
        });
        game.start(seed);

        for frame in 0..MAX_FRAMES {
            let (ball_x, paddle_x) = {
                let state = game.state();
                (state.ball.pos.x, state.paddle.center_x())
            };
            let input = game.input_mut();
            input.set(Direction::Left, ball_x < paddle_x - SLACK);
            input.set(Direction::Right, ball_x > paddle_x + SLACK);

            match game.frame(frame as f64 * FRAME_MS, Some(&mut renderer)) {
                FrameStep::Finished(summary) => return Some(summary),
                step if !step.reschedule() => return None,
                _ => {}
            }
        }
        log::debug!("Rendered {} frames", renderer.frames());
        None
    }
}
