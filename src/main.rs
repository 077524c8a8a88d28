//! Studio FX entry point
//!
//! In the browser this mounts every opted-in effect. Natively it runs a
//! headless walkthrough against the in-memory page so the simulation can be
//! watched in the log.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) keeps the existing logger
    let _ = console_log::init_with_level(log::Level::Info);

    log::info!("Studio FX starting...");
    let settings = studio_fx::FxSettings::load();
    let caps = studio_fx::Capabilities::detect();
    match studio_fx::platform::web::start(settings, caps) {
        Ok(engine) => studio_fx::platform::web::install(engine),
        Err(e) => log::error!("Effects disabled: {}", e),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Studio FX (native) starting...");
    log::info!("Native mode has no DOM - build for wasm32 to mount effects on a page");

    demo::magnetic_button();
    demo::page_breaker();
    demo::card_castle();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use studio_fx::Rect;
    use studio_fx::consts::FRAME_MS;
    use studio_fx::effects::{Interactive, MagneticButton};
    use studio_fx::platform::memory::{MemorySurface, RecordingTarget};
    use glam::Vec2;
    use studio_fx::settings::{BreakerConfig, CastleConfig, MagneticConfig};
    use studio_fx::sim::{CardCastle, CursorService, PageBreaker};

    use std::cell::RefCell;
    use std::rc::Rc;

    /// Sweep the cursor across a button and let it settle
    pub fn magnetic_button() {
        let cursor = CursorService::new(1280.0, 720.0, 0.0);
        let button = Rc::new(RefCell::new(MagneticButton::new(
            RecordingTarget::new(Rect::new(600.0, 340.0, 120.0, 40.0)),
            MagneticConfig::default(),
        )));

        let wake = Rc::new(RefCell::new(false));
        {
            let (button, wake) = (button.clone(), wake.clone());
            cursor.subscribe(move |sample| {
                if button.borrow_mut().on_pointer(sample) {
                    *wake.borrow_mut() = true;
                }
            });
        }

        let mut now = 0.0;
        for step in 0..12 {
            now += FRAME_MS;
            cursor.handle_move(560.0 + step as f32 * 10.0, 350.0, now);
            button.borrow_mut().frame();
        }
        cursor.handle_leave();

        let mut frames = 0;
        while button.borrow_mut().frame().wants_next_frame() {
            frames += 1;
        }
        let button = button.borrow();
        log::info!(
            "Magnetic button: woke={} settled after {} frames, {} transform writes, final {:?}",
            wake.borrow(),
            frames,
            button.target().transform_writes(),
            button.target().transform().to_css()
        );
    }

    /// Break a small page and watch it pile up on the floor
    pub fn page_breaker() {
        let mut page = MemorySurface::new(1280.0, 720.0).with_scroll(2400.0, 0.0);
        let header = page.add_element(None, &["header"], Rect::new(0.0, 0.0, 1280.0, 80.0));
        page.add_element(Some(header), &["nav"], Rect::new(900.0, 20.0, 300.0, 40.0));
        page.add_element(None, &["h1"], Rect::new(160.0, 160.0, 900.0, 90.0));
        page.add_element(None, &["p"], Rect::new(160.0, 280.0, 700.0, 60.0));
        page.add_element(None, &["button"], Rect::new(160.0, 380.0, 180.0, 48.0));
        for i in 0..3 {
            page.add_element(
                None,
                &[".card"],
                Rect::new(160.0 + i as f32 * 330.0, 480.0, 300.0, 200.0),
            );
        }

        let mut breaker: PageBreaker = PageBreaker::new(BreakerConfig::default(), 7);
        let mut now = 0.0;
        breaker.activate(&mut page, now);
        let mut frames = 0;
        while frames < 600 {
            now += FRAME_MS;
            frames += 1;
            if !breaker.update(&mut page, now).wants_next_frame() {
                break;
            }
        }

        let resting: Vec<String> = breaker
            .falling()
            .iter()
            .filter_map(|f| page.clones().find(|(id, _)| *id == f.clone))
            .map(|(_, c)| format!("({:.0}, {:.0}) {:.2}rad", c.transform.dx, c.transform.dy, c.transform.angle))
            .collect();
        log::info!(
            "Page breaker: {:?} after {} frames, {} bodies, {} clones",
            breaker.phase(),
            frames,
            breaker.dynamic_body_count(),
            page.clone_count()
        );
        log::info!("Clone offsets: {}", resting.join(", "));

        breaker.reset(&mut page);
        log::info!(
            "Reset: {} clones, {} hidden elements left",
            page.clone_count(),
            page.hidden_count()
        );
    }

    /// Knock the 404 card castle over and report where the cards ended up
    pub fn card_castle() {
        let mut castle: CardCastle = CardCastle::new(CastleConfig::default(), Rect::new(0.0, 0.0, 640.0, 420.0), 404);
        castle.knock(Vec2::new(240.0, 360.0));
        let mut frames = 0;
        while castle.step((FRAME_MS / 1000.0) as f32).wants_next_frame() {
            frames += 1;
        }
        let highest = (0..castle.layout().len())
            .filter_map(|i| castle.pose(i))
            .map(|p| p.position.y)
            .fold(f32::MAX, f32::min);
        log::info!(
            "Card castle: {:?} after {} frames, {} cards, highest card center at y = {:.0}",
            castle.phase(),
            frames,
            castle.layout().len(),
            highest
        );
    }
}
