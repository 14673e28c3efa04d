use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hardlock_core::{
    fingerprint, issue_license_file, KeyStore, LicenseConfig, LicensePayload, LicenseVerifier,
};

#[derive(Parser)]
#[command(name = "hardlock-admin", about = "Hardlock License Administration Tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an RSA keypair for license signing
    Keygen {
        /// Key size in bits
        #[arg(long, default_value = "4096")]
        bits: usize,
        /// Output directory for key files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Overwrite existing key files
        #[arg(long)]
        force: bool,
    },

    /// Issue a signed license file
    Issue {
        /// Licensee name
        #[arg(long)]
        licensee: String,
        /// Hardware fingerprint of the target machine (communicated
        /// out-of-band). Use --auto for the current machine.
        #[arg(long, required_unless_present = "auto")]
        machine_code: Option<String>,
        /// Use the current machine's fingerprint
        #[arg(long)]
        auto: bool,
        /// Days until expiry
        #[arg(long, default_value = "365")]
        days: i64,
        /// Output license file
        #[arg(long, default_value = "License.key")]
        output: PathBuf,
        /// Path to the private key PEM file
        #[arg(long, default_value = "private.pem")]
        private_key: PathBuf,
    },

    /// Print the hardware fingerprint of this machine
    Fingerprint,

    /// Show the contents of a license file
    Inspect {
        /// License file to inspect
        #[arg(long, default_value = "License.key")]
        file: PathBuf,
        /// Directory holding public.pem (defaults to the license file's)
        #[arg(long)]
        key_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen {
            bits,
            output_dir,
            force,
        } => cmd_keygen(bits, &output_dir, force),
        Commands::Issue {
            licensee,
            machine_code,
            auto,
            days,
            output,
            private_key,
        } => cmd_issue(&licensee, machine_code, auto, days, &output, &private_key),
        Commands::Fingerprint => cmd_fingerprint(),
        Commands::Inspect { file, key_dir } => cmd_inspect(&file, key_dir),
    }
}

fn cmd_keygen(bits: usize, output_dir: &PathBuf, force: bool) -> Result<()> {
    println!("Generating {}-bit RSA keypair...", bits);

    let config = LicenseConfig::in_dir(output_dir);
    let store = KeyStore::new(config.clone());
    store
        .generate_key_pair(bits, force)
        .context("Key generation failed (use --force to overwrite existing keys)")?;

    println!("Private key: {}", config.private_key_file.display());
    println!("Public key:  {}", config.public_key_file.display());
    println!();
    println!("IMPORTANT: Keep private.pem secure! Only distribute public.pem.");
    Ok(())
}

fn cmd_issue(
    licensee: &str,
    machine_code: Option<String>,
    auto: bool,
    days: i64,
    output: &PathBuf,
    private_key_path: &PathBuf,
) -> Result<()> {
    if days <= 0 {
        bail!("--days must be positive");
    }

    let machine_code = if auto {
        fingerprint::machine_fingerprint()
    } else {
        machine_code.unwrap()
    };

    let pem = std::fs::read_to_string(private_key_path).with_context(|| {
        format!(
            "Failed to read private key from {}",
            private_key_path.display()
        )
    })?;
    let private_key = hardlock_core::crypto::private_key_from_pem(&pem)?;

    let payload = LicensePayload::new(licensee.to_string(), machine_code, days);
    let file = issue_license_file(&payload, &private_key)?;
    std::fs::write(output, &file)
        .with_context(|| format!("Failed to write license file to {}", output.display()))?;

    println!("Signed license written to: {}", output.display());
    println!("  Licensee:    {}", payload.licensee);
    println!(
        "  Expires:     {}",
        payload
            .expiration_date()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    println!("  Fingerprint: {}", payload.hardware_fingerprint);
    Ok(())
}

fn cmd_fingerprint() -> Result<()> {
    println!("{}", fingerprint::machine_fingerprint());
    Ok(())
}

fn cmd_inspect(file: &PathBuf, key_dir: Option<PathBuf>) -> Result<()> {
    let dir = match key_dir {
        Some(dir) => dir,
        None => file
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let mut config = LicenseConfig::in_dir(&dir);
    config.license_file = file.clone();

    let info = LicenseVerifier::new(config).license_info();
    println!("Licensee:    {}", info.licensee);
    println!("Status:      {}", info.status);
    println!("Expires:     {}", info.expiration);
    println!("Fingerprint: {}", info.hardware_fingerprint);
    Ok(())
}
