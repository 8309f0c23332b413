use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use training_core::business::{
    effective_max_claims, get_available_cycles, get_business_level, next_cycle_at,
    total_business_money, upgrade_cost,
};
use training_core::calendar::date_key;
use training_core::config::DataConfig;
use training_core::level::{xp_progress, XP_PER_LEVEL};
use training_core::plan::{AmountDraft, FrequencyDraft, OverloadDraft};
use training_core::progression::overload_status_label;
use training_core::schedule::{amount_label, frequency_label, is_completed_today};
use training_core::*;

#[derive(Parser)]
#[command(name = "trainer")]
#[command(about = "Training game: earn XP and gold by working out", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Pretend the current time is this RFC 3339 timestamp
    #[arg(long, global = true, hide = true)]
    now: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show level, currencies and streak (default)
    Status,

    /// List catalog activities
    Activities {
        /// Only activities with this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show today's plan items
    Today,

    /// Complete a plan item
    Done {
        /// Plan item id
        id: String,
    },

    /// Manage the training plan
    #[command(subcommand)]
    Plan(PlanCommand),

    /// Buy, claim and upgrade businesses
    #[command(subcommand)]
    Biz(BizCommand),

    /// Print a JSON backup of all progress
    Export {
        /// Write completion history to this CSV file instead
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Restore progress from a JSON backup
    Import {
        /// Backup file produced by `export`
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum PlanCommand {
    /// List plan items
    List,

    /// Add a plan item
    Add(PlanItemArgs),

    /// Edit a plan item; omitted options keep their current values
    Edit {
        id: String,

        #[command(flatten)]
        args: PlanItemArgs,
    },

    /// Remove a plan item
    Remove { id: String },
}

#[derive(Subcommand)]
enum BizCommand {
    /// List businesses
    List,

    /// Buy a business
    Buy {
        /// Business definition id
        def_id: String,
    },

    /// Claim accrued cycles
    Claim {
        /// Instance id or business definition id
        id: String,
    },

    /// Buy the next level of an upgrade
    Upgrade {
        /// Instance id or business definition id
        id: String,
        upgrade_id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RateArg {
    Session,
    Weekly,
}

impl From<RateArg> for ProgressionRate {
    fn from(rate: RateArg) -> Self {
        match rate {
            RateArg::Session => ProgressionRate::Session,
            RateArg::Weekly => ProgressionRate::Weekly,
        }
    }
}

#[derive(Args)]
struct PlanItemArgs {
    /// Activity id from the catalog
    #[arg(long)]
    activity: Option<String>,

    /// Times per week (1-7); daily when omitted
    #[arg(long, conflicts_with = "daily")]
    weekly: Option<i64>,

    /// Switch a weekly item back to daily
    #[arg(long)]
    daily: bool,

    #[arg(long)]
    sets: Option<i64>,

    #[arg(long)]
    reps: Option<i64>,

    /// Minutes or seconds, for timed activities
    #[arg(long)]
    value: Option<i64>,

    /// Enable progressive overload at this rate
    #[arg(long, value_enum, conflicts_with = "no_overload")]
    overload: Option<RateArg>,

    /// Remove progressive overload
    #[arg(long)]
    no_overload: bool,

    #[arg(long)]
    start_sets: Option<i64>,

    #[arg(long)]
    start_reps: Option<i64>,

    #[arg(long)]
    max_sets: Option<i64>,

    #[arg(long)]
    max_reps: Option<i64>,

    #[arg(long)]
    reps_increment: Option<i64>,

    /// Starting target for timed overload
    #[arg(long)]
    start: Option<i64>,

    /// Ceiling for timed overload
    #[arg(long)]
    max: Option<i64>,

    /// Step for timed overload
    #[arg(long)]
    increment: Option<i64>,
}

type Session<'a> = GameSession<'a, JsonStateFile>;

fn main() -> Result<()> {
    // Keep stdout for command output; library info logs are noise here
    training_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    let now = cli.now.unwrap_or_else(Utc::now);
    tracing::debug!("Data dir {:?}, now {}", data_dir, now);

    let catalog = Catalog::load(&config.catalog)?;
    let sink = JsonStateFile::new(DataConfig::state_path(&data_dir));
    let state = sink.load()?;
    let mut session = GameSession::new(state, &catalog, sink);
    session.roll_day(now)?;

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => cmd_status(&session, &config),
        Commands::Activities { tag } => cmd_activities(&catalog, tag.as_deref()),
        Commands::Today => cmd_today(&session, &config, now),
        Commands::Done { id } => cmd_done(&mut session, &id, now)?,
        Commands::Plan(command) => cmd_plan(&mut session, &config, command, now)?,
        Commands::Biz(command) => cmd_biz(&mut session, command, now)?,
        Commands::Export { csv } => cmd_export(&session, csv, now)?,
        Commands::Import { file } => cmd_import(&mut session, &file)?,
    }

    Ok(())
}

fn refused(reason: &Rejected) {
    println!("✗ {}", reason);
}

fn activity_name<'a>(catalog: &'a Catalog, activity_id: &'a str) -> &'a str {
    catalog
        .activity(activity_id)
        .map(|a| a.name.as_str())
        .unwrap_or(activity_id)
}

fn cmd_status(session: &Session, config: &Config) {
    let state = session.state();
    let name = if config.profile.username.is_empty() {
        "Player"
    } else {
        config.profile.username.as_str()
    };

    println!("{} - Level {}", name, state.level());
    println!(
        "  XP: {}/{} ({} total)",
        xp_progress(state.xp),
        XP_PER_LEVEL,
        state.xp
    );
    println!("  Gold: {}", state.gold);
    println!("  Business money: {}", total_business_money(state));
    println!(
        "  Streak: {} days (best {})",
        state.stats.current_streak, state.stats.longest_streak
    );
}

fn cmd_activities(catalog: &Catalog, tag: Option<&str>) {
    let activities: Vec<&ActivityDefinition> = match tag {
        Some(tag) => catalog.activities_tagged(tag).collect(),
        None => catalog.activities.iter().collect(),
    };

    if activities.is_empty() {
        println!("No activities found.");
        return;
    }

    for def in activities {
        println!(
            "{:<12} {:<18} {:<5} xp x{} gold x{}  [{}]",
            def.id,
            def.name,
            def.unit,
            def.xp_multiplier,
            def.gold_multiplier,
            def.tags.join(", ")
        );
    }
}

fn print_plan_item(session: &Session, config: &Config, item: &TrainingPlanItem, now: DateTime<Utc>) {
    let state = session.state();
    println!(
        "{} {:<20} {:<16} {}",
        item.id,
        activity_name(session.catalog(), &item.activity_id),
        amount_label(item),
        frequency_label(state, item, now)
    );
    if config.profile.show_progressive {
        if let Some(po) = &item.progressive_overload {
            println!("    {}", overload_status_label(po));
        }
    }
}

fn cmd_today(session: &Session, config: &Config, now: DateTime<Utc>) {
    let due = session.due_today(now);
    if due.is_empty() {
        println!("Nothing due today.");
        return;
    }

    let today = date_key(now);
    for item in due {
        let done = is_completed_today(&session.state().completions, &item.id, &today);
        print!("[{}] ", if done { "x" } else { " " });
        print_plan_item(session, config, item, now);
    }
}

fn cmd_done(session: &mut Session, id: &str, now: DateTime<Utc>) -> Result<()> {
    let completion = match session.complete_activity(id, now)? {
        Ok(completion) => completion,
        Err(reason) => {
            refused(&reason);
            return Ok(());
        }
    };

    println!(
        "✓ Completed: +{} XP, +{} gold",
        completion.xp_earned, completion.gold_earned
    );
    if completion.progressed {
        if let Some(item) = session.state().plan_item(id) {
            println!("  Next target: {}", amount_label(item));
        }
    }
    if let Some(level_up) = completion.level_up {
        println!("★ Level up! {} -> {}", level_up.previous, level_up.current);
        let catalog = session.catalog();
        let names: Vec<&str> = level_up
            .unlocks
            .iter()
            .filter_map(|def_id| catalog.business(def_id))
            .map(|def| def.name.as_str())
            .collect();
        if !names.is_empty() {
            println!("  Businesses available: {}", names.join(", "));
        }
    }
    Ok(())
}

/// Start from an existing item's settings so edits only change what was given
fn base_draft(item: Option<&TrainingPlanItem>) -> PlanItemDraft {
    let Some(item) = item else {
        return PlanItemDraft {
            activity_id: String::new(),
            frequency: FrequencyDraft::Daily,
            amount: AmountDraft::default(),
            overload: None,
        };
    };

    let frequency = match item.frequency {
        Frequency::Daily => FrequencyDraft::Daily,
        Frequency::Weekly { times_per_week } => FrequencyDraft::Weekly {
            times_per_week: i64::from(times_per_week),
        },
    };
    let amount = match item.amount {
        Amount::Sets { sets, reps } => AmountDraft {
            sets: i64::from(sets),
            reps: i64::from(reps),
            value: 1,
        },
        Amount::Scalar { value, .. } => AmountDraft {
            value: i64::from(value),
            ..AmountDraft::default()
        },
    };
    let overload = item.progressive_overload.as_ref().map(|po| match po {
        ProgressiveOverload::Reps(r) => OverloadDraft::Reps {
            rate: r.rate,
            start_sets: i64::from(r.start_sets),
            start_reps: i64::from(r.start_reps),
            max_sets: i64::from(r.max_sets),
            max_reps: i64::from(r.max_reps),
            reps_increment: i64::from(r.reps_increment),
        },
        ProgressiveOverload::Time(t) => OverloadDraft::Time {
            rate: t.rate,
            start: i64::from(t.min),
            max: i64::from(t.max),
            increment: i64::from(t.increment),
        },
    });

    PlanItemDraft {
        activity_id: item.activity_id.clone(),
        frequency,
        amount,
        overload,
    }
}

fn apply_overload_args(
    args: &PlanItemArgs,
    current: Option<OverloadDraft>,
    def: &ActivityDefinition,
) -> Option<OverloadDraft> {
    if args.no_overload {
        return None;
    }
    let rate = args.overload.map(ProgressionRate::from);

    if def.unit.is_reps() {
        let (c_rate, c_ss, c_sr, c_ms, c_mr, c_inc) = match current {
            Some(OverloadDraft::Reps {
                rate,
                start_sets,
                start_reps,
                max_sets,
                max_reps,
                reps_increment,
            }) => (rate, start_sets, start_reps, max_sets, max_reps, reps_increment),
            _ => {
                // New overload only when a rate was asked for
                if rate.is_none() {
                    return None;
                }
                (ProgressionRate::Session, 1, 5, 3, 12, 1)
            }
        };
        Some(OverloadDraft::Reps {
            rate: rate.unwrap_or(c_rate),
            start_sets: args.start_sets.unwrap_or(c_ss),
            start_reps: args.start_reps.unwrap_or(c_sr),
            max_sets: args.max_sets.unwrap_or(c_ms),
            max_reps: args.max_reps.unwrap_or(c_mr),
            reps_increment: args.reps_increment.unwrap_or(c_inc),
        })
    } else {
        let (c_rate, c_start, c_max, c_inc) = match current {
            Some(OverloadDraft::Time {
                rate,
                start,
                max,
                increment,
            }) => (rate, start, max, increment),
            _ => {
                if rate.is_none() {
                    return None;
                }
                (ProgressionRate::Session, 10, 30, 1)
            }
        };
        Some(OverloadDraft::Time {
            rate: rate.unwrap_or(c_rate),
            start: args.start.unwrap_or(c_start),
            max: args.max.unwrap_or(c_max),
            increment: args.increment.unwrap_or(c_inc),
        })
    }
}

fn cmd_plan(
    session: &mut Session,
    config: &Config,
    command: PlanCommand,
    now: DateTime<Utc>,
) -> Result<()> {
    let (editing, args) = match command {
        PlanCommand::List => {
            let items = &session.state().training_plan.items;
            if items.is_empty() {
                println!("Training plan is empty.");
            }
            for item in items {
                print_plan_item(session, config, item, now);
            }
            return Ok(());
        }
        PlanCommand::Remove { id } => {
            match session.remove_plan_item(&id, now)? {
                Ok(item) => println!("✓ Removed {}", item.id),
                Err(reason) => refused(&reason),
            }
            return Ok(());
        }
        PlanCommand::Add(args) => (None, args),
        PlanCommand::Edit { id, args } => (Some(id), args),
    };

    let existing = match editing.as_deref() {
        Some(id) => match session.state().plan_item(id) {
            Some(item) => Some(item),
            None => {
                refused(&Rejected::UnknownPlanItem(id.to_string()));
                return Ok(());
            }
        },
        None => None,
    };
    let mut draft = base_draft(existing);

    if let Some(activity) = &args.activity {
        draft.activity_id = activity.clone();
    }
    let Some(def) = session.catalog().activity(&draft.activity_id) else {
        if draft.activity_id.is_empty() {
            println!("✗ --activity is required");
        } else {
            refused(&Rejected::UnknownActivity(draft.activity_id.clone()));
        }
        return Ok(());
    };

    if editing.is_none() {
        draft.amount = AmountDraft {
            sets: 3,
            reps: 10,
            value: def.durations.first().map(|d| i64::from(*d)).unwrap_or(10),
        };
    }
    if args.daily {
        draft.frequency = FrequencyDraft::Daily;
    } else if let Some(times_per_week) = args.weekly {
        draft.frequency = FrequencyDraft::Weekly { times_per_week };
    }
    draft.amount.sets = args.sets.unwrap_or(draft.amount.sets);
    draft.amount.reps = args.reps.unwrap_or(draft.amount.reps);
    draft.amount.value = args.value.unwrap_or(draft.amount.value);
    draft.overload = apply_overload_args(&args, draft.overload, def);

    match session.confirm_plan_item(editing.as_deref(), draft, now)? {
        Ok(id) => {
            let verb = if editing.is_some() { "Updated" } else { "Added" };
            println!("✓ {} {}", verb, id);
        }
        Err(reason) => refused(&reason),
    }
    Ok(())
}

/// Accept either an instance id or the id of an owned business definition
fn resolve_instance(session: &Session, id: &str) -> String {
    session
        .state()
        .businesses
        .iter()
        .find(|b| b.instance_id == id || b.def_id == id)
        .map(|b| b.instance_id.clone())
        .unwrap_or_else(|| id.to_string())
}

fn cmd_biz(session: &mut Session, command: BizCommand, now: DateTime<Utc>) -> Result<()> {
    match command {
        BizCommand::List => biz_list(session, now),
        BizCommand::Buy { def_id } => match session.purchase_business(&def_id, now)? {
            Ok(owned) => println!(
                "✓ Bought {} for {} gold ({})",
                owned.def_id, owned.gold_invested, owned.instance_id
            ),
            Err(reason) => refused(&reason),
        },
        BizCommand::Claim { id } => {
            let instance_id = resolve_instance(session, &id);
            match session.claim_interest(&instance_id, now)? {
                Ok(claim) => println!(
                    "✓ Claimed {} cycles: +{} money, +{} business XP (level {})",
                    claim.cycles, claim.money_gained, claim.xp_gained, claim.business_level
                ),
                Err(reason) => refused(&reason),
            }
        }
        BizCommand::Upgrade { id, upgrade_id } => {
            let instance_id = resolve_instance(session, &id);
            match session.purchase_upgrade(&instance_id, &upgrade_id)? {
                Ok(bought) => println!(
                    "✓ {} is now level {} (cost {})",
                    bought.upgrade_id, bought.new_level, bought.cost
                ),
                Err(reason) => refused(&reason),
            }
        }
    }
    Ok(())
}

fn biz_list(session: &Session, now: DateTime<Utc>) {
    let state = session.state();
    let level = state.level();

    for def in &session.catalog().businesses {
        let Some(owned) = state.businesses.iter().find(|b| b.def_id == def.id) else {
            let status = if level >= def.unlock_level {
                "available"
            } else {
                "locked"
            };
            println!(
                "{:<14} {:<16} cost {} gold, unlocks at level {} [{}]",
                def.id, def.name, def.base_cost, def.unlock_level, status
            );
            continue;
        };

        println!(
            "{:<14} {:<16} {} level {}, {} money",
            def.id,
            def.name,
            owned.instance_id,
            get_business_level(owned, def),
            owned.business_money
        );
        println!(
            "    cycles {}/{}, next at {}",
            get_available_cycles(owned, def, now),
            effective_max_claims(owned, def),
            next_cycle_at(owned, def, now).format("%Y-%m-%d %H:%M UTC")
        );
        for upg in &def.upgrades {
            let current = owned.upgrade_level(&upg.id);
            let next = if current >= upg.max_level {
                "maxed".to_string()
            } else {
                format!(
                    "next {} money, needs level {}",
                    upgrade_cost(upg, current),
                    upg.level_req_base
                )
            };
            println!(
                "    {:<14} {}/{}  {}",
                upg.id, current, upg.max_level, next
            );
        }
    }
}

fn cmd_export(session: &Session, csv: Option<PathBuf>, now: DateTime<Utc>) -> Result<()> {
    match csv {
        Some(path) => {
            let rows = training_core::export::export_completions_csv(session.state(), &path)?;
            println!("✓ Exported {} completions to {}", rows, path.display());
        }
        None => println!(
            "{}",
            training_core::export::export_bundle(session.state(), now)?
        ),
    }
    Ok(())
}

fn cmd_import(session: &mut Session, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)?;
    let state = training_core::export::import_bundle(&contents)?;
    session.replace_state(state)?;
    println!("✓ Imported backup from {}", file.display());
    Ok(())
}
