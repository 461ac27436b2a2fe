//! Veridity CLI — `vid` command.
//!
//! Manage self-sovereign identities: create them, add and revoke
//! claims, issue signed claim bundles to subjects, and assemble
//! circuit inputs for zero-knowledge proofs.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use veridity::crypto::hash::hash_bytes;
use veridity::storage::{load_snapshot, read_account, save_snapshot};
use veridity::{
    verify_bundle, Claim, ClaimProofBundle, Identity, IdentityId, Query, SchemaHash, SlotValue,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn veridity_dir() -> PathBuf {
    let home = std::env::var("HOME").expect("HOME not set");
    PathBuf::from(home).join(".veridity")
}

fn identity_path(name: &str) -> PathBuf {
    veridity_dir().join(format!("{name}.vid"))
}

// ── Passphrase helper ─────────────────────────────────────────────────────────

fn read_passphrase(prompt: &str) -> String {
    eprint!("{prompt}");
    let mut passphrase = String::new();
    std::io::stdin()
        .read_line(&mut passphrase)
        .expect("Failed to read passphrase");
    passphrase.trim().to_string()
}

// ── Output helper ─────────────────────────────────────────────────────────────

fn write_json(value: &serde_json::Value, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Veridity CLI — manage self-sovereign identities, claims, and proofs.
#[derive(Parser, Debug)]
#[command(
    name = "vid",
    about = "Veridity CLI",
    version,
    long_about = "vid — Veridity CLI\n\nManage self-sovereign identities: create them, add and revoke\nclaims, issue signed claim bundles, and assemble proof inputs."
)]
struct Cli {
    /// Use specific identity (default: default)
    #[arg(long, global = true, default_value = "default")]
    identity: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new identity
    Init {
        /// Name for the new identity
        #[arg(long)]
        name: Option<String>,
    },

    /// Display identity information (no passphrase required)
    Show {
        /// Identity name to show (overrides --identity)
        #[arg(long)]
        identity: Option<String>,
    },

    /// List all identities
    List,

    /// Manage claims in the identity's own claims tree
    Claim {
        #[command(subcommand)]
        subcommand: ClaimCommands,
    },

    /// Issue a signed claim bundle to a subject
    Issue {
        /// Subject identifier (base58)
        #[arg(long)]
        subject: String,

        /// Schema hash (32 hex chars)
        #[arg(long)]
        schema: String,

        /// First index data slot (u64)
        #[arg(long)]
        index_a: u64,

        /// Second index data slot (u64)
        #[arg(long, default_value_t = 0)]
        index_b: u64,

        /// Revocation nonce
        #[arg(long)]
        nonce: u64,

        /// Expiration (epoch seconds)
        #[arg(long)]
        expires: Option<i64>,

        /// Output file for the bundle JSON (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Receive and store a claim bundle from an issuer
    Receive {
        /// Path to the bundle JSON file
        bundle: PathBuf,
    },

    /// Assemble atomic-query circuit inputs for a verifier request
    Prove {
        /// Schema hash (32 hex chars)
        #[arg(long)]
        schema: String,

        /// Verifier request, e.g. '{"birthDay": {"$lt": 20100101}}'
        #[arg(long)]
        request: String,

        /// Data slot the queried field lives in (2, 3, 6, or 7)
        #[arg(long, default_value_t = 2)]
        slot: usize,

        /// Verifier challenge string
        #[arg(long)]
        challenge: String,

        /// Output file for the circuit inputs JSON (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Export the public account record as JSON
    Export {
        /// Identity name to export (overrides --identity)
        #[arg(long)]
        identity: Option<String>,

        /// Output file path (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ClaimCommands {
    /// Add a claim through a state transition
    Add {
        /// Schema hash (32 hex chars)
        #[arg(long)]
        schema: String,

        /// First index data slot (u64)
        #[arg(long)]
        index_a: u64,

        /// Second index data slot (u64)
        #[arg(long, default_value_t = 0)]
        index_b: u64,

        /// First value data slot (u64)
        #[arg(long, default_value_t = 0)]
        value_a: u64,

        /// Second value data slot (u64)
        #[arg(long, default_value_t = 0)]
        value_b: u64,

        /// Revocation nonce
        #[arg(long)]
        nonce: u64,

        /// Expiration (epoch seconds)
        #[arg(long)]
        expires: Option<i64>,

        /// Output file for the transition circuit inputs (default: none)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Revoke a claim by nonce through a state transition
    Revoke {
        /// Revocation nonce
        #[arg(long)]
        nonce: u64,
    },

    /// List held and received claims
    List,
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;
    let identity_name = cli.identity.clone();

    let result = match cli.command {
        Commands::Init { name } => cmd_init(name, verbose),
        Commands::Show { identity } => {
            let name = identity.unwrap_or(identity_name);
            cmd_show(&name, verbose)
        }
        Commands::List => cmd_list(),
        Commands::Claim { subcommand } => match subcommand {
            ClaimCommands::Add {
                schema,
                index_a,
                index_b,
                value_a,
                value_b,
                nonce,
                expires,
                output,
            } => cmd_claim_add(
                &identity_name,
                &schema,
                index_a,
                index_b,
                value_a,
                value_b,
                nonce,
                expires,
                output.as_deref(),
                verbose,
            ),
            ClaimCommands::Revoke { nonce } => cmd_claim_revoke(&identity_name, nonce),
            ClaimCommands::List => cmd_claim_list(&identity_name),
        },
        Commands::Issue {
            subject,
            schema,
            index_a,
            index_b,
            nonce,
            expires,
            output,
        } => cmd_issue(
            &identity_name,
            &subject,
            &schema,
            index_a,
            index_b,
            nonce,
            expires,
            output.as_deref(),
        ),
        Commands::Receive { bundle } => cmd_receive(&identity_name, &bundle),
        Commands::Prove {
            schema,
            request,
            slot,
            challenge,
            output,
        } => cmd_prove(
            &identity_name,
            &schema,
            &request,
            slot,
            &challenge,
            output.as_deref(),
        ),
        Commands::Export { identity, output } => {
            let name = identity.unwrap_or(identity_name);
            cmd_export(&name, output.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `vid init [--name NAME]`
fn cmd_init(name: Option<String>, verbose: bool) -> Result<()> {
    let name = name.unwrap_or_else(|| "default".to_string());
    let path = identity_path(&name);

    if path.exists() {
        return Err(anyhow!(
            "identity '{}' already exists at {}",
            name,
            path.display()
        ));
    }

    std::fs::create_dir_all(veridity_dir()).context("failed to create identity directory")?;

    let passphrase = read_passphrase("Enter passphrase for new identity: ");
    if passphrase.is_empty() {
        return Err(anyhow!("passphrase cannot be empty"));
    }
    let confirm = read_passphrase("Confirm passphrase: ");
    if passphrase != confirm {
        return Err(anyhow!("passphrases do not match"));
    }

    let identity = Identity::new().context("failed to create identity")?;
    save_snapshot(&identity, &path, &passphrase).context("failed to save identity")?;

    println!("Created identity '{name}'");
    println!("  ID:    {}", identity.id());
    println!("  State: {}", identity.state());
    println!("  File:  {}", path.display());

    if verbose {
        println!("  Key:   {}", hex::encode(identity.verifying_key_bytes()));
    }

    Ok(())
}

/// `vid show [--identity NAME]`
fn cmd_show(name: &str, verbose: bool) -> Result<()> {
    let account = read_account(&existing_path(name)?).context("failed to read identity file")?;

    println!("Identity: {name}");
    println!("  ID:              {}", account.id);
    println!("  State:           {}", account.state);
    println!("  Claims root:     {}", account.claims_root);
    println!("  Revocation root: {}", account.revocation_root);
    println!("  Roots root:      {}", account.roots_root);
    println!("  Claims held:     {}", account.claims.len());
    println!("  Received:        {}", account.received.len());
    println!("  Revoked nonces:  {}", account.revoked_nonces.len());

    if verbose {
        for claim in &account.claims {
            println!(
                "  claim schema={} nonce={}",
                claim.schema, claim.revocation_nonce
            );
        }
    }

    Ok(())
}

/// `vid list`
fn cmd_list() -> Result<()> {
    let dir = veridity_dir();
    if !dir.exists() {
        println!("No identities found.");
        return Ok(());
    }

    let mut found = false;
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("vid") {
            continue;
        }
        found = true;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("?")
            .to_string();
        match read_account(&path) {
            Ok(account) => println!("{name}  {}", account.id),
            Err(e) => println!("{name}  (unreadable: {e})"),
        }
    }
    if !found {
        println!("No identities found.");
    }
    Ok(())
}

/// `vid claim add`
#[allow(clippy::too_many_arguments)]
fn cmd_claim_add(
    name: &str,
    schema: &str,
    index_a: u64,
    index_b: u64,
    value_a: u64,
    value_b: u64,
    nonce: u64,
    expires: Option<i64>,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let path = existing_path(name)?;
    let passphrase = read_passphrase("Enter passphrase: ");
    let mut identity = load_snapshot(&path, &passphrase).context("failed to load identity")?;

    let mut builder = Claim::builder(SchemaHash::from_hex(schema)?)
        .index_data(SlotValue::from_u64(index_a), SlotValue::from_u64(index_b))
        .value_data(SlotValue::from_u64(value_a), SlotValue::from_u64(value_b))
        .revocation_nonce(nonce);
    if let Some(at) = expires {
        builder = builder.expiration(at);
    }
    let claim = builder.build()?;

    let record = identity.add_claim(&claim)?;
    save_snapshot(&identity, &path, &passphrase).context("failed to save identity")?;

    println!("Added claim schema={} nonce={nonce}", claim.schema);
    println!("  Old state: {}", record.old_tree_state.state);
    println!("  New state: {}", record.new_state);
    if verbose {
        println!("  Genesis transition: {}", record.is_old_state_genesis);
        println!("  Signature: {}", record.signature);
    }
    if output.is_some() {
        write_json(&serde_json::json!(record.circuit_inputs()), output)?;
    }
    Ok(())
}

/// `vid claim revoke --nonce N`
fn cmd_claim_revoke(name: &str, nonce: u64) -> Result<()> {
    let path = existing_path(name)?;
    let passphrase = read_passphrase("Enter passphrase: ");
    let mut identity = load_snapshot(&path, &passphrase).context("failed to load identity")?;

    let record = identity.revoke(nonce)?;
    save_snapshot(&identity, &path, &passphrase).context("failed to save identity")?;

    println!("Revoked nonce {nonce}");
    println!("  New state: {}", record.new_state);
    Ok(())
}

/// `vid claim list`
fn cmd_claim_list(name: &str) -> Result<()> {
    let account = read_account(&existing_path(name)?)?;

    println!("Held claims:");
    for claim in &account.claims {
        println!(
            "  schema={} nonce={} subject={}",
            claim.schema,
            claim.revocation_nonce,
            claim
                .subject
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
    println!("Received bundles:");
    for bundle in &account.received {
        println!(
            "  schema={} nonce={} issuer={}",
            bundle.proofs.claim.schema, bundle.proofs.claim.revocation_nonce, bundle.issuer_id
        );
    }
    Ok(())
}

/// `vid issue`
#[allow(clippy::too_many_arguments)]
fn cmd_issue(
    name: &str,
    subject: &str,
    schema: &str,
    index_a: u64,
    index_b: u64,
    nonce: u64,
    expires: Option<i64>,
    output: Option<&Path>,
) -> Result<()> {
    let path = existing_path(name)?;
    let passphrase = read_passphrase("Enter passphrase: ");
    let mut identity = load_snapshot(&path, &passphrase).context("failed to load identity")?;

    let mut builder = Claim::builder(SchemaHash::from_hex(schema)?)
        .index_data(SlotValue::from_u64(index_a), SlotValue::from_u64(index_b))
        .revocation_nonce(nonce)
        .subject(IdentityId::from_base58(subject)?);
    if let Some(at) = expires {
        builder = builder.expiration(at);
    }
    let claim = builder.build()?;

    identity.add_claim(&claim)?;
    let bundle = veridity::issue_bundle(&identity, &claim)?;
    save_snapshot(&identity, &path, &passphrase).context("failed to save identity")?;

    println!("Issued claim schema={} nonce={nonce} to {subject}", claim.schema);
    write_json(&serde_json::to_value(&bundle)?, output)?;
    Ok(())
}

/// `vid receive BUNDLE`
fn cmd_receive(name: &str, bundle_path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(bundle_path)
        .with_context(|| format!("reading {}", bundle_path.display()))?;
    let bundle: ClaimProofBundle =
        serde_json::from_str(&json).context("failed to parse bundle")?;

    verify_bundle(&bundle).context("bundle failed verification")?;

    let path = existing_path(name)?;
    let passphrase = read_passphrase("Enter passphrase: ");
    let mut identity = load_snapshot(&path, &passphrase).context("failed to load identity")?;
    identity.store_bundle(bundle.clone());
    save_snapshot(&identity, &path, &passphrase).context("failed to save identity")?;

    println!(
        "Stored bundle schema={} from issuer {}",
        bundle.proofs.claim.schema, bundle.issuer_id
    );
    Ok(())
}

/// `vid prove`
fn cmd_prove(
    name: &str,
    schema: &str,
    request: &str,
    slot: usize,
    challenge: &str,
    output: Option<&Path>,
) -> Result<()> {
    let schema = SchemaHash::from_hex(schema)?;
    let request: serde_json::Value =
        serde_json::from_str(request).context("request must be valid JSON")?;
    let query = Query::from_request(schema, &request, |_| Ok(slot))?;

    let path = existing_path(name)?;
    let passphrase = read_passphrase("Enter passphrase: ");
    let identity = load_snapshot(&path, &passphrase).context("failed to load identity")?;

    let inputs = identity.atomic_query_inputs(hash_bytes(challenge.as_bytes()), &query)?;
    write_json(&serde_json::json!(inputs.circuit_inputs()), output)?;
    Ok(())
}

/// `vid export [--identity NAME]`
fn cmd_export(name: &str, output: Option<&Path>) -> Result<()> {
    let account = read_account(&existing_path(name)?)?;
    write_json(&serde_json::to_value(&account)?, output)
}

fn existing_path(name: &str) -> Result<PathBuf> {
    let path = identity_path(name);
    if !path.exists() {
        return Err(anyhow!(
            "identity '{}' not found (expected at {})",
            name,
            path.display()
        ));
    }
    Ok(path)
}
