//! `babel-storage keygen` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use bsp_crypto::{generate_keypair, write_keypair_pem, KEY_BITS};
use bsp_engine::EngineError;

/// Arguments for the `keygen` command.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Destination for the PKCS#8 PEM private key.
    #[arg(long, default_value = "private.pem")]
    pub privkey: PathBuf,

    /// Destination for the SubjectPublicKeyInfo PEM public key.
    #[arg(long, default_value = "public.pem")]
    pub pubkey: PathBuf,
}

/// Run the keygen command. RSA-4096 generation takes a few seconds.
///
/// # Errors
///
/// Returns an error if generation or writing fails.
pub fn run(args: &KeygenArgs) -> Result<()> {
    eprintln!("generating RSA-{KEY_BITS} key pair, this takes a moment...");
    let (private, public) = generate_keypair(KEY_BITS).map_err(EngineError::from)?;
    write_keypair_pem(&private, &public, &args.privkey, &args.pubkey)
        .map_err(EngineError::from)?;
    println!(
        "wrote {} and {}",
        args.privkey.display(),
        args.pubkey.display()
    );
    Ok(())
}
