use clap::Parser;
use sarcfs::cli::Cli;
use sarcfs::engine::Engine;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Cli::parse().into_validated_args();
    let engine = Engine::new(args.content_dirs, args.work_dir);
    sarcfs::mount::mount(engine, &args.mount_point)
}
