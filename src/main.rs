//! BucketSync CLI - fingerprint-gated uploads and downloads
//!
//! Each subcommand stands in for one workflow node and prints that node's
//! log output.

use bucketsync::config::{resolve_under_base, CliArgs, Commands, ConnectionConfig, NODES};
use bucketsync::connector::Connector;
use bucketsync::error::{require_non_empty, BucketSyncError, Result};
use bucketsync::progress::ProgressReporter;
use bucketsync::sync::{DownloadBucketOptions, UploadFilesOptions, UploadFolderOptions};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();

    // Log entries are printed on stdout, so tracing stays quieter by default
    let level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    if let Commands::Nodes = args.command {
        cmd_nodes();
        return Ok(());
    }

    let base_dir = match &args.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| BucketSyncError::io(".", e))?,
    };

    let config = ConnectionConfig::from_cli(&args)?;
    tracing::debug!("Connecting with {:?}", config);

    let progress = if args.quiet {
        ProgressReporter::disabled()
    } else {
        ProgressReporter::new()
    };
    let connector = Connector::connect(args.backend, config, args.handshake)?.with_progress(progress);

    handle_command(&connector, &args, &base_dir)?;

    if args.verbose > 0 {
        eprintln!("{}", connector.summary().describe());
    }
    Ok(())
}

fn handle_command(connector: &Connector, args: &CliArgs, base_dir: &std::path::Path) -> Result<()> {
    let bucket = args.bucket.as_deref();
    let local = |path: &str, name: &str| -> Result<PathBuf> {
        require_non_empty(path, name)?;
        Ok(resolve_under_base(base_dir, path))
    };

    match &args.command {
        Commands::Init => {
            println!("{}", connector.connected_entry());
        }
        Commands::CreateBucket { bucket_name } => {
            let entry = connector.create_bucket(bucket_name)?;
            println!("{}", bucket_name);
            println!("{}", entry);
        }
        Commands::UploadFile {
            file_path,
            object_name,
            prefix,
        } => {
            let path = local(file_path, "file_path")?;
            println!("{}", connector.upload_file(bucket, &path, object_name, prefix)?);
        }
        Commands::UploadFiles {
            pattern,
            object_name,
            prefix,
        } => {
            let pattern = local(pattern, "pattern")?;
            let options = UploadFilesOptions {
                object_name: object_name.clone(),
                prefix: prefix.clone(),
            };
            println!("{}", connector.upload_files(bucket, &pattern.to_string_lossy(), &options)?);
        }
        Commands::DownloadFile { object_name, file_path } => {
            let path = local(file_path, "file_path")?;
            println!("{}", connector.download_file(bucket, object_name, &path)?);
        }
        Commands::UploadFolder {
            folder_path,
            prefix,
            pattern,
        } => {
            let folder = local(folder_path, "folder_path")?;
            let options = UploadFolderOptions {
                prefix: prefix.clone(),
                pattern: pattern.clone(),
            };
            println!("{}", connector.upload_folder(bucket, &folder, &options)?);
        }
        Commands::DownloadBucket {
            folder_path,
            pattern,
            replace_from,
            replace_to,
            mock,
        } => {
            let folder = local(folder_path, "folder_path")?;
            let options = DownloadBucketOptions {
                pattern: pattern.clone(),
                replace_from: replace_from.clone(),
                replace_to: replace_to.clone(),
                mock: *mock,
            };
            println!("{}", connector.download_bucket(bucket, &folder, &options)?);
        }
        Commands::Nodes => cmd_nodes(),
    }

    Ok(())
}

fn cmd_nodes() {
    println!("=== Nodes ===\n");
    for node in NODES {
        println!("  {:<36} {}", node.node_name(), node.display_name());
        println!("  {:<36} {} (bucketsync {})", "", node.category.path(), node.command);
    }
}
