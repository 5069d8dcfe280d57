use clap::{Args, Parser, Subcommand};
use forge_client::{DEFAULT_ENDPOINT, HttpStore, StoreConfig, Uploader};
use forge_core::prelude::*;
use forge_core::AUTH_KEY_ENV;
use forge_fs::FileSystemStorage;
use forge_server::prelude::*;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Web asset pipeline: manifests, blob uploads, HTML injection and a local asset server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ManifestArgs {
    /// Directory containing the game assets
    #[arg(long, default_value = "game/bin/data/core")]
    source: PathBuf,

    /// Directory the manifest.json is written to
    #[arg(short, long, default_value = "game/bin")]
    output: PathBuf,
}

#[derive(Args)]
struct RemoteArgs {
    /// Blob store URL
    #[arg(long, env = "FORGE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    #[arg(long, env = AUTH_KEY_ENV, hide_env_values = true)]
    auth_key: Option<String>,
}

impl RemoteArgs {
    fn store(self) -> anyhow::Result<HttpStore> {
        Ok(HttpStore::new(StoreConfig {
            endpoint: self.endpoint,
            auth_key: self.auth_key,
            ..Default::default()
        })?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the asset manifest
    Manifest(ManifestArgs),
    /// Upload assets missing from the blob store
    Upload {
        /// Upload every asset without checking the store first
        #[arg(short, long)]
        force: bool,

        #[arg(short, long, default_value = "game/bin/manifest.json")]
        manifest: PathBuf,

        #[arg(short, long, default_value = "game/bin/data/core")]
        assets: PathBuf,

        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Serve a directory with CORS headers for local web builds
    Serve {
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        #[arg(short, long, default_value = "game/bin")]
        dir: PathBuf,
    },
    /// Embed the manifest into the game's HTML page
    Inject {
        #[arg(short, long, default_value = "build/web/game.html")]
        input: PathBuf,

        /// Output HTML file (default: same as input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, default_value = "game/bin/manifest.json")]
        manifest: PathBuf,
    },
    /// Generate the manifest, upload and inject in one step
    Package {
        #[command(flatten)]
        manifest: ManifestArgs,

        #[arg(short, long)]
        force: bool,

        #[arg(long, default_value = "build/web/game.html")]
        html: PathBuf,

        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Run a local blob store
    Store {
        #[arg(short, long, default_value_t = 8787)]
        port: u16,

        /// Directory the blobs are stored in
        #[arg(long, default_value = "forge_data")]
        data: PathBuf,

        #[arg(long, env = AUTH_KEY_ENV, hide_env_values = true)]
        auth_key: String,
    },
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
}

async fn serve(app: axum::Router, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{addr}");
    println!("Press Ctrl+C to stop");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn generate(args: &ManifestArgs) -> anyhow::Result<(Manifest, PathBuf)> {
    println!("🔍 Generating manifest...");
    println!("Source: {}", args.source.display());
    println!("Output: {}\n", args.output.display());

    let generator = Generator::new(&args.source, &args.output);
    let manifest = generator.generate()?;
    let path = generator.output_path();

    println!(
        "✅ Manifest written to {} ({} entries)",
        path.display(),
        manifest.len()
    );
    Ok((manifest, path))
}

async fn upload(
    store: HttpStore,
    manifest: &Manifest,
    assets: PathBuf,
    force: bool,
) -> anyhow::Result<()> {
    let report = Uploader::new(store, assets).upload(manifest, force).await?;
    println!("✅ Upload complete: {report}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Manifest(args) => {
            generate(&args)?;
        }
        Commands::Upload {
            force,
            manifest,
            assets,
            remote,
        } => {
            let store = remote.store()?;
            let manifest_data = Manifest::load(&manifest).map_err(|e| match e {
                ManifestError::NotFound(path) => anyhow::anyhow!(
                    "manifest not found at {}. Run 'forge manifest' first to generate it.",
                    path.display()
                ),
                e => e.into(),
            })?;

            println!("🚀 Uploading to {}", store.base_url());
            println!("Manifest: {}", manifest.display());
            println!("Assets:   {}\n", assets.display());

            upload(store, &manifest_data, assets, force).await?;
        }
        Commands::Serve { port, dir } => {
            println!("Serving {}", dir.display());
            serve(DevServer::new(dir).build()?, port).await?;
        }
        Commands::Inject {
            input,
            output,
            manifest,
        } => {
            let manifest = inject_file(&input, output.as_deref(), &manifest)?;
            println!(
                "✅ Injected {} entries into {}",
                manifest.len(),
                output.as_ref().unwrap_or(&input).display()
            );
        }
        Commands::Package {
            manifest,
            force,
            html,
            remote,
        } => {
            // Credentials are checked before any work starts.
            let store = remote.store()?;

            println!("📦 Running full package pipeline...\n");
            let (generated, manifest_path) = generate(&manifest)?;

            println!();
            upload(store, &generated, manifest.source.clone(), force).await?;

            inject_file(&html, None, &manifest_path)?;
            println!("✅ Injected manifest into {}", html.display());
        }
        Commands::Store {
            port,
            data,
            auth_key,
        } => {
            println!("🗄️  Blob store data: {}", data.display());
            let app = BlobStoreServer::default()
                .build(FileSystemStorage::new(data), SharedSecretAuth::new(auth_key));
            serve(app, port).await?;
        }
    }

    Ok(())
}
