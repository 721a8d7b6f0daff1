//! Command handlers: thin orchestration over the engine and identity store.

use crate::cli::Commands;
use crate::error::CliError;
use crate::{editor, envfile, prompt};
use envvault_crypto::encode_public_key;
use envvault_engine::{
    run_doctor, ArtifactStore, ShareOutcome, VaultEngine, VaultError,
};
use envvault_identity::IdentityStore;
use envvault_store::list_central;
use std::io::{Read, Write};

pub fn dispatch(command: &Commands) -> Result<(), CliError> {
    let identity = IdentityStore::open_default()?;

    match command {
        Commands::Init { label } => cmd_init(&identity, label.as_deref()),
        Commands::Identity => cmd_identity(&identity),
        Commands::InitRepo { env_file } => cmd_init_repo(&identity, env_file.as_deref()),
        Commands::Add {
            target,
            file,
            merge,
        } => cmd_add(&identity, target, file.as_deref(), *merge),
        Commands::Get { target, out_file } => cmd_get(
            &identity,
            target.as_deref().unwrap_or("."),
            out_file.as_deref(),
        ),
        Commands::Share {
            target,
            public_key,
            label,
        } => cmd_share(&identity, target, public_key, label.as_deref()),
        Commands::Revoke {
            target,
            fingerprint,
        } => cmd_revoke(&identity, target, fingerprint),
        Commands::Recipients { target, json } => {
            cmd_recipients(&identity, target.as_deref().unwrap_or("."), *json)
        }
        Commands::List => cmd_list(&identity),
        Commands::Rm { name, force } => cmd_rm(&identity, name, *force),
        Commands::Edit { target } => cmd_edit(&identity, target.as_deref().unwrap_or(".")),
        Commands::Doctor { fix } => cmd_doctor(&identity, *fix),
        Commands::Reset { force } => cmd_reset(&identity, *force),
    }
}

/// Resolves `<name|.>` to an artifact store: '.' is the current project's
/// local vault, anything else a named vault under the central root.
fn resolve_store(identity: &IdentityStore, target: &str) -> Result<ArtifactStore, CliError> {
    if target == "." {
        Ok(ArtifactStore::local(&std::env::current_dir()?))
    } else {
        ArtifactStore::central(identity.root(), target)
            .map_err(VaultError::from)
            .map_err(CliError::from)
    }
}

fn default_label() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .map(|user| format!("{user}-device"))
        .unwrap_or_else(|_| "device".to_string())
}

fn cmd_init(identity: &IdentityStore, label: Option<&str>) -> Result<(), CliError> {
    if identity.is_initialized() {
        return Err(envvault_identity::IdentityError::AlreadyInitialized.into());
    }

    let label = label.map(str::to_string).unwrap_or_else(default_label);
    let password = prompt::new_password()?;

    println!("Deriving identity key (this takes a moment)...");
    let config = identity.initialize(&password, &label)?;

    println!("Identity created for {:?}", config.device_label);
    println!("  public key:  {}", encode_public_key(&identity.public_key()?));
    println!("  fingerprint: {}", config.fingerprint);
    println!("Share the public key with vault owners to receive access.");
    Ok(())
}

fn cmd_identity(identity: &IdentityStore) -> Result<(), CliError> {
    let config = identity.config()?;
    println!("label:       {}", config.device_label);
    println!("public key:  {}", encode_public_key(&identity.public_key()?));
    println!("fingerprint: {}", config.fingerprint);
    println!("created:     {}", config.created_at.to_rfc3339());
    Ok(())
}

fn cmd_init_repo(identity: &IdentityStore, env_file: Option<&std::path::Path>) -> Result<(), CliError> {
    if !identity.is_initialized() {
        return Err(VaultError::NoIdentity.into());
    }

    let store = ArtifactStore::local(&std::env::current_dir()?);
    let content = match env_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::Input(format!("cannot read {}: {e}", path.display())))?;
            envfile::parse(&text)?;
            text
        }
        None => envfile::template(store.name()),
    };

    let mut overwrite = false;
    if store.exists() {
        overwrite = prompt::confirm(&format!(
            "Vault {:?} already exists; overwrite its content?",
            store.name()
        ))?;
        if !overwrite {
            return Err(CliError::Aborted);
        }
    }

    let password = prompt::password("Password: ")?;
    let engine = VaultEngine::new(identity, &store);
    engine.init_vault(&password, content.as_bytes(), overwrite)?;

    println!("Vault created in {}", store.dir().display());
    println!("Commit the encrypted artifacts to share them with your team.");
    Ok(())
}

fn cmd_add(
    identity: &IdentityStore,
    target: &str,
    file: Option<&std::path::Path>,
    merge: bool,
) -> Result<(), CliError> {
    let store = resolve_store(identity, target)?;
    let engine = VaultEngine::new(identity, &store);

    let input = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| CliError::Input(format!("cannot read {}: {e}", path.display())))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| CliError::Input(format!("cannot read stdin: {e}")))?;
            buf
        }
    };
    let entries = envfile::parse(&input)?;

    let password = prompt::password("Password: ")?;

    if merge && store.exists() {
        let current = engine.get(&password)?;
        let base = String::from_utf8(current)
            .map_err(|_| CliError::Input("existing content is not valid UTF-8".to_string()))?;
        let merged = envfile::merge(&base, &entries);
        engine.put(&password, merged.as_bytes())?;
    } else {
        engine.put(&password, input.as_bytes())?;
    }

    println!(
        "Encrypted {} entr{} into vault {:?}",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" },
        store.name()
    );
    Ok(())
}

fn cmd_get(
    identity: &IdentityStore,
    target: &str,
    out_file: Option<&std::path::Path>,
) -> Result<(), CliError> {
    let store = resolve_store(identity, target)?;
    let engine = VaultEngine::new(identity, &store);

    let password = prompt::password("Password: ")?;
    let plaintext = engine.get(&password)?;

    match out_file {
        Some(path) => {
            std::fs::write(path, &plaintext)?;
            restrict_mode(path)?;
            eprintln!("Decrypted to {}", path.display());
        }
        None => std::io::stdout().write_all(&plaintext)?,
    }
    Ok(())
}

fn cmd_share(
    identity: &IdentityStore,
    target: &str,
    public_key: &str,
    label: Option<&str>,
) -> Result<(), CliError> {
    let store = resolve_store(identity, target)?;
    let engine = VaultEngine::new(identity, &store);

    let password = prompt::password("Password: ")?;
    match engine.share(&password, public_key, label)? {
        ShareOutcome::Added { fingerprint, label } => {
            println!("Shared {:?} with {label} ({fingerprint})", store.name());
            println!("Commit the updated recipients file to distribute access.");
        }
        ShareOutcome::AlreadyShared { fingerprint, label } => {
            println!("{fingerprint} is already a recipient as {:?}; nothing to do", label);
        }
    }
    Ok(())
}

fn cmd_revoke(identity: &IdentityStore, target: &str, fingerprint: &str) -> Result<(), CliError> {
    let store = resolve_store(identity, target)?;
    let engine = VaultEngine::new(identity, &store);

    let password = prompt::password("Password: ")?;
    match engine.revoke(&password, fingerprint) {
        Ok(()) => {
            println!(
                "Revoked {fingerprint} from {:?}; data key rotated",
                store.name()
            );
            Ok(())
        }
        Err(VaultError::NotARecipient(fp)) => {
            eprintln!("Current recipients of {:?}:", store.name());
            if let Ok(list) = engine.recipients() {
                for r in &list.recipients {
                    eprintln!("  {}  {}", r.fingerprint, r.label);
                }
            }
            Err(VaultError::NotARecipient(fp).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_recipients(identity: &IdentityStore, target: &str, json: bool) -> Result<(), CliError> {
    let store = resolve_store(identity, target)?;
    let engine = VaultEngine::new(identity, &store);
    let list = engine.recipients()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&list).map_err(|e| CliError::Input(e.to_string()))?
        );
        return Ok(());
    }

    println!("Vault {:?} (dek_version {})", store.name(), list.dek_version);
    for r in &list.recipients {
        println!(
            "  {}  {}  added {}{}",
            r.fingerprint,
            r.label,
            r.added_at.format("%Y-%m-%d"),
            if r.is_caller { "  (this device)" } else { "" }
        );
    }
    Ok(())
}

fn cmd_list(identity: &IdentityStore) -> Result<(), CliError> {
    let names = list_central(identity.root()).map_err(VaultError::from)?;
    if names.is_empty() {
        println!("No central vaults (use 'add <name>' to create one)");
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(())
}

fn cmd_rm(identity: &IdentityStore, name: &str, force: bool) -> Result<(), CliError> {
    let store = ArtifactStore::central(identity.root(), name)
        .map_err(VaultError::from)?;
    if !store.exists() {
        return Err(VaultError::VaultNotFound(name.to_string()).into());
    }
    if !force && !prompt::confirm(&format!("Delete vault {name:?} permanently?"))? {
        return Err(CliError::Aborted);
    }
    store.remove().map_err(VaultError::from)?;
    println!("Deleted vault {name:?}");
    Ok(())
}

fn cmd_edit(identity: &IdentityStore, target: &str) -> Result<(), CliError> {
    let store = resolve_store(identity, target)?;
    let engine = VaultEngine::new(identity, &store);

    let password = prompt::password("Password: ")?;
    let changed = engine.edit(&password, |content| {
        editor::edit_bytes(&content)
            .map_err(|e| VaultError::Io(std::io::Error::other(e.to_string())))
    })?;

    if changed {
        let version = engine.recipients()?.dek_version;
        println!("Vault updated; data key rotated (version {version})");
    } else {
        println!("No changes");
    }
    Ok(())
}

fn cmd_doctor(identity: &IdentityStore, fix: bool) -> Result<(), CliError> {
    let cwd = std::env::current_dir()?;
    let report = run_doctor(identity, Some(&cwd), fix)?;

    for issue in &report.issues {
        println!("issue:   {issue}");
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    for fix in &report.fixes_applied {
        println!("fixed:   {fix}");
    }

    if report.is_healthy() {
        println!(
            "ok ({} warning{})",
            report.warnings.len(),
            if report.warnings.len() == 1 { "" } else { "s" }
        );
        Ok(())
    } else {
        Err(CliError::Input(format!(
            "{} issue(s) found (re-run with --fix to tighten modes)",
            report.issues.len()
        )))
    }
}

fn cmd_reset(identity: &IdentityStore, force: bool) -> Result<(), CliError> {
    if !identity.is_initialized() {
        println!("Nothing to reset");
        return Ok(());
    }
    if !force
        && !prompt::confirm("Delete this device's identity and ALL central vaults permanently?")?
    {
        return Err(CliError::Aborted);
    }
    identity.reset()?;
    println!("Identity and central vaults removed");
    Ok(())
}

#[cfg(unix)]
fn restrict_mode(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_mode(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}
