//! Command execution logic.
//!
//! Each `execute_*` function runs one command against an [`App`] and prints
//! its result in the requested [`OutputMode`]. Mutating commands save before
//! reporting success.

use anyhow::Result;
use std::collections::HashMap;

use super::args::{
    BlockedArgs, DepAction, DepArgs, InfoArgs, InitArgs, ItemAction, ItemArgs, PlanArgs,
    ReadyArgs,
};
use crate::app::App;
use crate::domain::{EdgeId, Item, ItemFilter, ItemId, ItemStatus, ItemUpdate, NewItem};
use crate::error::Error;
use crate::output::{self, DepTreeNode, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.prefix.as_deref()).await?;

    if !args.quiet {
        println!("Initialized waypoint in {}", result.waypoint_dir.display());
        println!("  Config:      {}", result.config_file.display());
        println!("  Roadmap:     {}", result.data_file.display());
        println!("  Item prefix: {}", result.prefix);
    }

    Ok(())
}

/// Execute the info command
pub async fn execute_info(app: &App, _args: &InfoArgs, output_mode: OutputMode) -> Result<()> {
    let items = app.store().list_items(&ItemFilter::default()).await?;
    let edges = app.store().all_edges().await?;
    let efforts = app.graph().branch_effort().await?;

    let mut counts: HashMap<ItemStatus, usize> = HashMap::new();
    for item in &items {
        *counts.entry(item.status).or_default() += 1;
    }
    let count = |status: ItemStatus| counts.get(&status).copied().unwrap_or(0);

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "waypoint_dir": app.waypoint_dir().display().to_string(),
                "item_prefix": app.prefix(),
                "items": {
                    "total": items.len(),
                    "planned": count(ItemStatus::Planned),
                    "in_progress": count(ItemStatus::InProgress),
                    "completed": count(ItemStatus::Completed),
                    "cancelled": count(ItemStatus::Cancelled),
                },
                "dependencies": edges.len(),
                "branches": efforts,
            }))?;
        }
        OutputMode::Text => {
            println!("Waypoint Repository Information");
            println!("===============================");
            println!();
            println!("Directory:    {}", app.waypoint_dir().display());
            println!("Item prefix:  {}", app.prefix());
            println!();
            println!(
                "Items: {} total ({} planned, {} in progress, {} completed, {} cancelled)",
                items.len(),
                count(ItemStatus::Planned),
                count(ItemStatus::InProgress),
                count(ItemStatus::Completed),
                count(ItemStatus::Cancelled)
            );
            println!("Dependencies: {}", edges.len());
            println!();
            output::print_branch_effort(&efforts, output_mode)?;
        }
    }

    Ok(())
}

/// Execute the item command
pub async fn execute_item(app: &mut App, args: &ItemArgs, output_mode: OutputMode) -> Result<()> {
    match &args.action {
        ItemAction::Create {
            title,
            description,
            priority,
            branch,
            milestone,
            owner,
            effort,
        } => {
            let item = app
                .store_mut()
                .create_item(NewItem {
                    title: title.clone(),
                    description: description.clone().unwrap_or_default(),
                    priority: *priority,
                    branch: branch.clone(),
                    milestone: milestone.clone(),
                    owner: owner.clone(),
                    effort_days: *effort,
                })
                .await?;
            app.save().await?;

            match output_mode {
                OutputMode::Json => output::print_json(&item)?,
                OutputMode::Text => {
                    println!("Created item: {}", item.id);
                    output::print_item(&item, output_mode)?;
                }
            }
        }
        ItemAction::List {
            status,
            filter,
            limit,
        } => {
            let filter = ItemFilter {
                status: status.map(Into::into),
                ..filter.to_filter(Some(*limit))
            };
            let items = app.store().list_items(&filter).await?;
            output::print_items(&items, output_mode)?;
        }
        ItemAction::Show { item_id } => {
            let id = ItemId::new(item_id);
            let item = require_item(app, &id).await?;
            let deps = app.graph().list_dependencies(&id, None).await?;
            let dependents = app.graph().list_dependents(&id, None).await?;
            output::print_item_details(&item, &deps, &dependents, output_mode)?;
        }
        ItemAction::Update {
            item_id,
            title,
            description,
            status,
            priority,
            branch,
            no_branch,
            milestone,
            no_milestone,
            owner,
            no_owner,
            effort,
            no_effort,
        } => {
            let updates = ItemUpdate {
                title: title.clone(),
                description: description.clone(),
                status: status.map(Into::into),
                priority: *priority,
                branch: optional_change(branch.clone(), *no_branch),
                milestone: optional_change(milestone.clone(), *no_milestone),
                owner: optional_change(owner.clone(), *no_owner),
                effort_days: optional_change(*effort, *no_effort),
            };
            let item = app
                .store_mut()
                .update_item(&ItemId::new(item_id), updates)
                .await?;
            app.save().await?;

            match output_mode {
                OutputMode::Json => output::print_json(&item)?,
                OutputMode::Text => {
                    println!("Updated item: {}", item.id);
                    output::print_item(&item, output_mode)?;
                }
            }
        }
        ItemAction::Delete { item_id } => {
            let id = ItemId::new(item_id);
            let removed = app.graph_mut().delete_item(&id).await?;
            app.save().await?;

            match output_mode {
                OutputMode::Json => output::print_json(&serde_json::json!({
                    "deleted": id,
                    "removed_dependencies": removed,
                }))?,
                OutputMode::Text => {
                    println!(
                        "Deleted item: {id} (and {} dependenc{})",
                        removed.len(),
                        if removed.len() == 1 { "y" } else { "ies" }
                    );
                }
            }
        }
    }

    Ok(())
}

/// `--foo X` sets, `--no-foo` clears, neither leaves the field alone.
fn optional_change<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear { Some(None) } else { value.map(Some) }
}

async fn require_item(app: &App, id: &ItemId) -> Result<Item> {
    Ok(app
        .store()
        .get_item(id)
        .await?
        .ok_or_else(|| Error::ItemNotFound(id.clone()))?)
}

/// Execute the dep command
pub async fn execute_dep(app: &mut App, args: &DepArgs, output_mode: OutputMode) -> Result<()> {
    match &args.action {
        DepAction::Add {
            from,
            to,
            edge_type,
        } => {
            let edge = app
                .graph_mut()
                .create_dependency(&ItemId::new(from), &ItemId::new(to), (*edge_type).into())
                .await?;
            app.save().await?;

            match output_mode {
                OutputMode::Json => output::print_json(&edge)?,
                OutputMode::Text => {
                    println!(
                        "Added dependency {}: {} --[{}]--> {}",
                        edge.id, edge.source_id, edge.edge_type, edge.target_id
                    );
                }
            }
        }
        DepAction::Remove { edge_id } => {
            let edge = app
                .graph_mut()
                .delete_dependency(&EdgeId::new(edge_id))
                .await?;
            app.save().await?;

            match output_mode {
                OutputMode::Json => output::print_json(&edge)?,
                OutputMode::Text => {
                    println!(
                        "Removed dependency {}: {} --> {}",
                        edge.id, edge.source_id, edge.target_id
                    );
                }
            }
        }
        DepAction::Type { edge_id, edge_type } => {
            let edge = app
                .graph_mut()
                .update_dependency_type(&EdgeId::new(edge_id), (*edge_type).into())
                .await?;
            app.save().await?;

            match output_mode {
                OutputMode::Json => output::print_json(&edge)?,
                OutputMode::Text => {
                    println!("Dependency {} is now ({})", edge.id, edge.edge_type);
                }
            }
        }
        DepAction::List {
            item_id,
            reverse,
            edge_type,
        } => {
            let id = ItemId::new(item_id);
            let type_filter = edge_type.map(Into::into);
            let edges = if *reverse {
                app.graph().list_dependents(&id, type_filter).await?
            } else {
                app.graph().list_dependencies(&id, type_filter).await?
            };
            output::print_edges(&edges, *reverse, output_mode)?;
        }
        DepAction::Tree { item_id, depth } => {
            let id = ItemId::new(item_id);
            let tree = app.graph().dependency_tree(&id, *depth).await?;
            let root = require_item(app, &id).await?;
            let dependents = app.graph().list_dependents(&id, None).await?;

            let mut items = HashMap::new();
            for (edge, _) in &tree {
                if let Some(item) = app.store().get_item(&edge.target_id).await? {
                    items.insert(item.id.clone(), item);
                }
            }

            let node = DepTreeNode::build(&root, &tree, &items);
            output::print_dep_tree(&node, &dependents, output_mode)?;
        }
        DepAction::Check { from, to } => {
            let (from_id, to_id) = (ItemId::new(from), ItemId::new(to));
            let would_cycle = app.graph().would_create_cycle(&from_id, &to_id).await?;

            match output_mode {
                OutputMode::Json => output::print_json(&serde_json::json!({
                    "from": from_id,
                    "to": to_id,
                    "would_create_cycle": would_cycle,
                }))?,
                OutputMode::Text if would_cycle => {
                    println!("{from} -> {to} would create a cycle");
                }
                OutputMode::Text => println!("{from} -> {to} is safe to add"),
            }
        }
        DepAction::Cycles { item_id } => {
            let starts = match item_id {
                Some(id) => vec![ItemId::new(id)],
                None => app
                    .store()
                    .list_items(&ItemFilter::default())
                    .await?
                    .into_iter()
                    .map(|item| item.id)
                    .collect(),
            };

            let mut cycles: Vec<Vec<ItemId>> = Vec::new();
            for start in &starts {
                for cycle in app.graph().find_all_cycles(start).await? {
                    if !cycles.iter().any(|known| same_cycle(known, &cycle)) {
                        cycles.push(cycle);
                    }
                }
            }
            output::print_cycles(&cycles, output_mode)?;
        }
    }

    Ok(())
}

/// Two cycles are the same if one is a rotation of the other.
fn same_cycle(a: &[ItemId], b: &[ItemId]) -> bool {
    a.len() == b.len()
        && (0..a.len()).any(|shift| a.iter().cycle().skip(shift).take(a.len()).eq(b.iter()))
}

/// Execute the ready command
pub async fn execute_ready(app: &App, args: &ReadyArgs, output_mode: OutputMode) -> Result<()> {
    let items = app
        .graph()
        .ready_items(&args.filter.to_filter(Some(args.limit)))
        .await?;

    match output_mode {
        OutputMode::Json => output::print_json(&items)?,
        OutputMode::Text if items.is_empty() => println!("No ready items found."),
        OutputMode::Text => {
            println!("Ready to start ({} item(s)):", items.len());
            println!();
            for item in &items {
                output::print_item(item, output_mode)?;
            }
        }
    }

    Ok(())
}

/// Execute the blocked command
pub async fn execute_blocked(app: &App, args: &BlockedArgs, output_mode: OutputMode) -> Result<()> {
    let mut blocked = app.graph().blocked_items().await?;
    if let Some(branch) = &args.branch {
        blocked.retain(|entry| entry.item.branch.as_ref() == Some(branch));
    }
    output::print_blocked(&blocked, output_mode)?;
    Ok(())
}

/// Execute the plan command
pub async fn execute_plan(app: &App, args: &PlanArgs, output_mode: OutputMode) -> Result<()> {
    let mut items = app.graph().planning_order().await?;
    items.retain(|item| {
        (args.all || !item.is_terminal())
            && args
                .branch
                .as_ref()
                .is_none_or(|branch| item.branch.as_ref() == Some(branch))
    });
    output::print_plan(&items, output_mode)?;
    Ok(())
}
