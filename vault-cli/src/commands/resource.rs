//! Resource commands shared by every kind
//!
//! Bodies and patches are passed as JSON objects whose fields match the
//! kind, e.g. `--body '{"name": "Work"}'` for a profile or
//! `--set '{"api_key": "sk-new"}'` to rotate an API key.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;
use vault_store::models::{FieldValue, ListQuery, NewRecord, OwnerScope, RecordPatch, SortOrder, Tags};
use vault_store::{ResourceKind, ResourceStore, Vault};

#[derive(Parser, Debug)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub command: ResourceCommand,
}

#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    /// Create a record (safe to retry with the same --request-id)
    Create(CreateArgs),
    /// Fetch a record by id
    Get {
        id: String,
        /// Only return the record if this user owns it
        #[arg(long)]
        user: Option<String>,
        /// Narrow the ownership check to one profile
        #[arg(long, requires = "user")]
        profile: Option<String>,
    },
    /// Fetch a record by natural key (email for users, user/provider for API keys)
    Find { key: String },
    /// Replace the supplied fields of a record (safe to retry with the same --request-id)
    Update(UpdateArgs),
    /// Delete a record
    Delete { id: String },
    /// List records owned by a user
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Idempotency token (default: random UUID)
    #[arg(long)]
    pub request_id: Option<String>,
    /// Record id (default: implied by the owner, else a random UUID)
    #[arg(long)]
    pub id: Option<String>,
    /// Owning user id
    #[arg(long)]
    pub user: String,
    /// Owning profile id
    #[arg(long)]
    pub profile: Option<String>,
    /// Tag to attach (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    /// Record body as a JSON object
    #[arg(long, default_value = "{}")]
    pub body: String,
    /// Creation time (RFC 3339; default: now)
    #[arg(long)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: String,
    /// Idempotency token (default: random UUID)
    #[arg(long)]
    pub request_id: Option<String>,
    /// Replacement tag (repeatable; replaces the whole list)
    #[arg(long = "tag", value_name = "TAG", conflicts_with = "clear_tags")]
    pub tags: Vec<String>,
    /// Remove every tag
    #[arg(long)]
    pub clear_tags: bool,
    /// Fields to replace as a JSON object
    #[arg(long, default_value = "{}")]
    pub set: String,
    /// Update time (RFC 3339; default: now)
    #[arg(long)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Owning user id
    #[arg(long)]
    pub user: String,
    /// Narrow to one profile
    #[arg(long)]
    pub profile: Option<String>,
    /// Required tag (repeatable; records must carry all of them)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    /// Payload equality filter, e.g. provider=openai or data.done=true (repeatable)
    #[arg(long = "field", value_name = "PATH=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
    /// Earliest creation time (inclusive)
    #[arg(long)]
    pub from: Option<DateTime<Utc>>,
    /// Latest creation time (inclusive)
    #[arg(long)]
    pub to: Option<DateTime<Utc>>,
    /// Page size (1-100)
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
    /// Sort by creation time: asc or desc
    #[arg(long, default_value = "desc")]
    pub sort: SortOrder,
    /// Print only the number of matches
    #[arg(long)]
    pub count: bool,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((path, value)) if !path.is_empty() => Ok((path.to_owned(), value.to_owned())),
        _ => Err(format!("expected PATH=VALUE, got '{}'", raw)),
    }
}

/// `true`/`false` and integers compare as JSON scalars; anything else as text
fn field_value(raw: &str) -> FieldValue {
    match raw {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(FieldValue::Integer)
            .unwrap_or_else(|_| FieldValue::Text(raw.to_owned())),
    }
}

fn request_id(supplied: Option<String>) -> String {
    supplied.unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run_resource<K: ResourceKind>(vault: &Vault, args: ResourceArgs) -> Result<()> {
    let store = vault.store::<K>();
    match args.command {
        ResourceCommand::Create(args) => run_create(&store, args),
        ResourceCommand::Get { id, user, profile } => {
            let record = match user {
                Some(user_id) => store.get_scoped(&OwnerScope { user_id, profile_id: profile }, &id)?,
                None => store.get(&id)?,
            };
            print_json(&record)
        }
        ResourceCommand::Find { key } => print_json(&store.get_by_natural_key(&key)?),
        ResourceCommand::Update(args) => run_update(&store, args),
        ResourceCommand::Delete { id } => {
            store.delete(&id)?;
            print_json(&json!({ "deleted": id }))
        }
        ResourceCommand::List(args) => run_list(&store, args),
    }
}

fn run_create<K: ResourceKind>(store: &ResourceStore<K>, args: CreateArgs) -> Result<()> {
    let body: K::Body = serde_json::from_str(&args.body)
        .with_context(|| format!("Invalid {} body", K::NAME))?;
    let scope = OwnerScope {
        user_id: args.user,
        profile_id: args.profile,
    };
    let id = args
        .id
        .or_else(|| K::derived_id(&scope))
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let request_id = request_id(args.request_id);
    debug!(kind = K::NAME, %id, %request_id, "create");

    let mut new = NewRecord::new(id, scope, body);
    if !args.tags.is_empty() {
        new = new.with_tags(Tags::new(args.tags)?);
    }
    if let Some(at) = args.created_at {
        new = new.created_at(at);
    }

    print_json(&store.create(&request_id, new)?)
}

fn run_update<K: ResourceKind>(store: &ResourceStore<K>, args: UpdateArgs) -> Result<()> {
    let fields: K::Patch = serde_json::from_str(&args.set)
        .with_context(|| format!("Invalid {} fields", K::NAME))?;
    let mut patch = RecordPatch::fields(fields);
    if args.clear_tags {
        patch = patch.with_tags(Tags::empty());
    } else if !args.tags.is_empty() {
        patch = patch.with_tags(Tags::new(args.tags)?);
    }
    if let Some(at) = args.updated_at {
        patch = patch.updated_at(at);
    }

    let request_id = request_id(args.request_id);
    debug!(kind = K::NAME, id = %args.id, %request_id, "update");
    print_json(&store.update(&request_id, &args.id, patch)?)
}

fn run_list<K: ResourceKind>(store: &ResourceStore<K>, args: ListArgs) -> Result<()> {
    let mut query = ListQuery::for_user(args.user)
        .limit(args.limit)
        .offset(args.offset)
        .sort(args.sort);
    if let Some(profile) = args.profile {
        query = query.profile(profile);
    }
    for tag in args.tags {
        query = query.tag(tag);
    }
    for (path, value) in &args.fields {
        query = query.field_eq(path.as_str(), field_value(value));
    }
    if let Some(from) = args.from {
        query = query.from(from);
    }
    if let Some(to) = args.to {
        query = query.to(to);
    }

    if args.count {
        let total = store.count(&query)?;
        return print_json(&json!({ "count": total }));
    }

    print_json(&store.list(&query)?)
}
