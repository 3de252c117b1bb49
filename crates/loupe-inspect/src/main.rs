use tracing::info;

use loupe_inspect::{bridge, InspectorAgent};
use loupe_model::harness::sample_page;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting loupe inspector agent");
    let fixture = sample_page();
    let mut agent = InspectorAgent::new(fixture.page);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut reader = stdin.lock();
    let mut writer = stdout.lock();
    if let Err(err) = bridge::serve(&mut agent, &mut reader, &mut writer) {
        eprintln!("loupe-inspect error: {err}");
        std::process::exit(1);
    }
}
