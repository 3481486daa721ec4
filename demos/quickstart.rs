use heliodial::{EngineConfig, Instant, SolarEngine};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let engine = match SolarEngine::new(EngineConfig::default()) {
        Ok(engine) => engine,
        Err(error) => {
            eprintln!("engine construction failed: {error}");
            return;
        }
    };

    // Kick off a schedule refresh in the background; the tick below
    // does not wait for it.
    engine.refresh_cycle();

    let now = Instant::now(0);
    let frame = engine.compute_frame(now);

    println!("JD:        {}", frame.julian_date);
    println!("noon:      {}", frame.noon_label);
    println!(
        "sunrise:   {}",
        frame.sunrise_label.as_deref().unwrap_or("--:--")
    );
    println!(
        "sunset:    {}",
        frame.sunset_label.as_deref().unwrap_or("--:--")
    );
    println!("daylength: {}", frame.day_length_label);
    println!("cycle:     {:?}", frame.cycle_health);
    for arc in &frame.nights {
        println!("night:     {} – {}", arc.start_label, arc.end_label);
    }
}
