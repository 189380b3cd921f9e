use polars::prelude::{AnyValue, DataFrame};
use staffing_planner::{
    AssignmentMode, BulkPlan, CapPolicy, Channel, ChannelWorkload, IntradayPlan, Period,
    PlanningConfig, Planner, Roster, Tier, load_bulk_plan_json, roster, save_blocks_csv,
    save_bulk_csv, save_bulk_plan_json, save_hourly_csv, save_roster_csv, tables,
};
use std::io::{self, Write};

fn cell_text(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, s) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(s);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(s.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_df(result: polars::prelude::PolarsResult<DataFrame>) {
    match result {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error rendering table: {}", e),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  config show                        Show the planning configuration\n  config load <json_path>            Load configuration from JSON\n  config save <json_path>            Save configuration to JSON\n  config set <key> <value>           Set shrinkage|growth (percent), shift (hours),\n                                     concurrency_primary|concurrency_secondary,\n                                     downtime (minutes/week), cap <mode> [threshold]\n  capacity <YYYY-MM>                 Business days and hours per agent for a month\n  size <YYYY-MM> <vol1> <aht1_s> [<vol2> <aht2_s>]\n                                     Size one month from primary/secondary volume and AHT\n  bulk <volume_csv> <aht_csv>        Size every period in the two tables\n  intraday <events_csv>              Hourly demand from raw events (needs bulk)\n  roster [cyclic|blocks]             Build a roster from the intraday result\n  roster count <n>                   Build a roster for an explicit headcount\n  blocks                             Show the shift blocks of the current roster\n  show [bulk|intraday|roster|summary]\n                                     Show a stored result\n  save <snapshot|bulk|hourly|roster|blocks> <path>\n                                     Write a bulk JSON snapshot or a CSV export\n  load snapshot <path>               Load a bulk JSON snapshot\n  quit|exit                          Exit"
    );
}

fn print_config(config: &PlanningConfig) {
    let working_days = config
        .calendar
        .working_days()
        .iter()
        .map(|wd| wd.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    println!("Shift hours        : {}", config.shift_hours);
    println!("Shrinkage          : {:.1}%", config.shrinkage_rate * 100.0);
    println!("Growth             : {:.1}%", config.growth_rate * 100.0);
    println!(
        "Concurrency        : primary {} / secondary {}",
        config.concurrency.primary, config.concurrency.secondary
    );
    println!("Weekly downtime    : {} min", config.weekly_downtime_minutes);
    println!("Low-volume cap     : {:?}", config.low_volume_cap);
    println!("Working days       : {}", working_days);
    println!("Holidays           : {}", config.calendar.holidays().len());
}

fn parse_cap(mode: &str, threshold: Option<&str>) -> Option<CapPolicy> {
    match mode {
        "disabled" | "off" => Some(CapPolicy::Disabled),
        "all" | "all_tiers" => Some(CapPolicy::AllTiers),
        "secondary" | "secondary_only" => Some(CapPolicy::SecondaryOnly),
        "below" | "below_volume" => threshold
            .and_then(|t| t.parse::<f64>().ok())
            .map(|threshold| CapPolicy::BelowVolume { threshold }),
        _ => None,
    }
}

fn apply_setting(config: &mut PlanningConfig, key: &str, value: &str, extra: Option<&str>) -> bool {
    if key == "cap" {
        return match parse_cap(value, extra) {
            Some(policy) => {
                config.low_volume_cap = policy;
                true
            }
            None => false,
        };
    }
    let Ok(number) = value.parse::<f64>() else {
        return false;
    };
    match key {
        "shrinkage" => config.shrinkage_rate = number / 100.0,
        "growth" => config.growth_rate = number / 100.0,
        "shift" => config.shift_hours = number,
        "concurrency_primary" => config.concurrency.primary = number,
        "concurrency_secondary" => config.concurrency.secondary = number,
        "downtime" => config.weekly_downtime_minutes = number,
        _ => return false,
    }
    true
}

fn print_roster(roster: &Roster) {
    print_df(roster.to_dataframe());
    let coverage = roster
        .coverage_by_day()
        .into_iter()
        .map(|(day, count)| format!("{}={}", roster::day_name(day), count))
        .collect::<Vec<_>>()
        .join(", ");
    println!("Coverage by day: {}", coverage);
}

fn main() {
    env_logger::init();

    let mut config = PlanningConfig::default();
    let mut planner = match Planner::new(config.clone()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Invalid default configuration: {}", e);
            return;
        }
    };
    let mut bulk: Option<BulkPlan> = None;
    let mut intraday: Option<IntradayPlan> = None;
    let mut current_roster: Option<Roster> = None;

    println!("Staffing Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "config" => match parts.next() {
                Some("show") | None => print_config(planner.config()),
                Some("load") => match parts.next() {
                    Some(path) => match PlanningConfig::load_json(path).and_then(|c| {
                        let p = Planner::new(c.clone())?;
                        Ok((c, p))
                    }) {
                        Ok((c, p)) => {
                            config = c;
                            planner = p;
                            println!("Configuration loaded from {}.", path);
                            print_config(planner.config());
                        }
                        Err(e) => println!("Error loading configuration: {}", e),
                    },
                    None => println!("Usage: config load <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match planner.config().save_json(path) {
                        Ok(_) => println!("Configuration saved to {}.", path),
                        Err(e) => println!("Error saving configuration: {}", e),
                    },
                    None => println!("Usage: config save <json_path>"),
                },
                Some("set") => {
                    let key = parts.next();
                    let value = parts.next();
                    match (key, value) {
                        (Some(key), Some(value)) => {
                            let mut candidate = config.clone();
                            if !apply_setting(&mut candidate, key, value, parts.next()) {
                                println!("Unknown setting or invalid value '{} {}'.", key, value);
                                continue;
                            }
                            match Planner::new(candidate.clone()) {
                                Ok(p) => {
                                    config = candidate;
                                    planner = p;
                                    println!("{} set.", key);
                                }
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                        _ => println!("Usage: config set <key> <value>"),
                    }
                }
                Some(other) => {
                    println!("Unknown config command '{}'.", other);
                    println!("Usage: config show|load <json_path>|save <json_path>|set <key> <value>");
                }
            },
            "capacity" => match parts.next().map(str::parse::<Period>) {
                Some(Ok(period)) => {
                    let days = planner.calendar().business_days_in(period);
                    let hours = staffing_planner::capacity::effective_hours(
                        days,
                        planner.config().shift_hours,
                        planner.config().shrinkage_rate,
                    );
                    println!(
                        "{}: business_days={}, capacity_hours={:.2}",
                        period, days, hours
                    );
                }
                Some(Err(e)) => println!("Invalid period: {}", e),
                None => println!("Usage: capacity <YYYY-MM>"),
            },
            "size" => {
                let args: Vec<&str> = parts.collect();
                let period = match args.first().map(|s| s.parse::<Period>()) {
                    Some(Ok(p)) => p,
                    Some(Err(e)) => {
                        println!("Invalid period: {}", e);
                        continue;
                    }
                    None => {
                        println!("Usage: size <YYYY-MM> <vol1> <aht1_s> [<vol2> <aht2_s>]");
                        continue;
                    }
                };
                let numbers: Result<Vec<f64>, _> =
                    args[1..].iter().map(|s| s.parse::<f64>()).collect();
                let numbers = match numbers {
                    Ok(n) if n.len() == 2 || n.len() == 4 => n,
                    _ => {
                        println!("Usage: size <YYYY-MM> <vol1> <aht1_s> [<vol2> <aht2_s>]");
                        continue;
                    }
                };
                let mut channels = vec![ChannelWorkload::new(
                    Tier::Primary,
                    Channel::Email,
                    numbers[0],
                    numbers[1],
                )];
                if numbers.len() == 4 {
                    channels.push(ChannelWorkload::new(
                        Tier::Secondary,
                        Channel::Email,
                        numbers[2],
                        numbers[3],
                    ));
                }
                match planner.size_period(period, &channels) {
                    Ok(sizing) => {
                        for tier in &sizing.tiers {
                            println!(
                                "{} {}: workload_hours={:.2}, headcount={}",
                                sizing.period, tier.tier, tier.workload_hours, tier.headcount
                            );
                        }
                        println!(
                            "{}: capacity_hours={:.2}, total_headcount={}",
                            sizing.period, sizing.capacity_hours, sizing.total_headcount
                        );
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "bulk" => match (parts.next(), parts.next()) {
                (Some(volume_path), Some(aht_path)) => {
                    let result = tables::load_volume_table(volume_path).and_then(|volume| {
                        let aht = tables::load_aht_table(aht_path)?;
                        planner.aggregate(&volume, &aht)
                    });
                    match result {
                        Ok(plan) => {
                            print_df(plan.to_dataframe());
                            if !plan.unmatched_periods.is_empty() {
                                let skipped = plan
                                    .unmatched_periods
                                    .iter()
                                    .map(Period::key)
                                    .collect::<Vec<_>>()
                                    .join(", ");
                                println!("Skipped periods missing from one table: {}", skipped);
                            }
                            println!("Bulk sized ({})", planner.summary(&plan, None, None).to_cli_summary());
                            bulk = Some(plan);
                            intraday = None;
                            current_roster = None;
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => println!("Usage: bulk <volume_csv> <aht_csv>"),
            },
            "intraday" => match parts.next() {
                Some(path) => {
                    let Some(plan) = bulk.as_ref() else {
                        println!("Run 'bulk' or 'load snapshot' first.");
                        continue;
                    };
                    match tables::load_events(path).and_then(|events| planner.disaggregate(&events, plan)) {
                        Ok(result) => {
                            print_df(result.to_dataframe());
                            if let Some(peak) = result.peak_hour() {
                                println!(
                                    "Intraday {}: observed_days={}, peak {:02}:00 needs {} agent(s)",
                                    result.period, result.observed_days, peak.hour, peak.headcount_target
                                );
                            }
                            intraday = Some(result);
                            current_roster = None;
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                None => println!("Usage: intraday <events_csv>"),
            },
            "roster" => {
                let result = match parts.next() {
                    Some("count") => match parts.next().map(str::parse::<u32>) {
                        Some(Ok(total)) => planner.build_roster(total, None),
                        _ => {
                            println!("Usage: roster count <n>");
                            continue;
                        }
                    },
                    mode @ (None | Some("cyclic") | Some("blocks")) => {
                        let Some(plan) = intraday.as_ref() else {
                            println!("Run 'intraday' first or use 'roster count <n>'.");
                            continue;
                        };
                        let mode = if mode == Some("blocks") {
                            AssignmentMode::Blocks
                        } else {
                            AssignmentMode::Cyclic
                        };
                        planner.roster_for(plan, mode)
                    }
                    Some(other) => {
                        println!("Unknown roster mode '{}'.", other);
                        continue;
                    }
                };
                match result {
                    Ok(built) => {
                        print_roster(&built);
                        current_roster = Some(built);
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "blocks" => match current_roster.as_ref().and_then(|r| r.blocks.as_ref()) {
                Some(blocks) => print_df(roster::blocks_dataframe(blocks)),
                None => println!("No shift blocks; build a roster from an intraday result first."),
            },
            "show" => match parts.next() {
                Some("bulk") | None => match bulk.as_ref() {
                    Some(plan) => print_df(plan.to_dataframe()),
                    None => println!("No bulk result."),
                },
                Some("intraday") => match intraday.as_ref() {
                    Some(plan) => print_df(plan.to_dataframe()),
                    None => println!("No intraday result."),
                },
                Some("roster") => match current_roster.as_ref() {
                    Some(r) => print_roster(r),
                    None => println!("No roster."),
                },
                Some("summary") => {
                    let empty = BulkPlan::default();
                    let summary = planner.summary(
                        bulk.as_ref().unwrap_or(&empty),
                        intraday.as_ref(),
                        current_roster.as_ref(),
                    );
                    println!("Summary ({})", summary.to_cli_summary());
                }
                Some(other) => println!("Unknown result '{}'.", other),
            },
            "save" => {
                let what = parts.next();
                let path = parts.next();
                let result = match (what, path) {
                    (Some("snapshot"), Some(path)) => bulk
                        .as_ref()
                        .map(|plan| save_bulk_plan_json(plan, path)),
                    (Some("bulk"), Some(path)) => {
                        bulk.as_ref().map(|plan| save_bulk_csv(plan, path))
                    }
                    (Some("hourly"), Some(path)) => {
                        intraday.as_ref().map(|plan| save_hourly_csv(plan, path))
                    }
                    (Some("roster"), Some(path)) => {
                        current_roster.as_ref().map(|r| save_roster_csv(r, path))
                    }
                    (Some("blocks"), Some(path)) => current_roster
                        .as_ref()
                        .and_then(|r| r.blocks.as_ref())
                        .map(|blocks| save_blocks_csv(blocks, path)),
                    _ => {
                        println!("Usage: save <snapshot|bulk|hourly|roster|blocks> <path>");
                        continue;
                    }
                };
                match result {
                    Some(Ok(())) => println!("Saved to {}.", path.unwrap_or_default()),
                    Some(Err(e)) => println!("Error saving: {}", e),
                    None => println!("Nothing to save yet."),
                }
            }
            "load" => match (parts.next(), parts.next()) {
                (Some("snapshot"), Some(path)) => match load_bulk_plan_json(path) {
                    Ok(plan) => {
                        println!("Bulk snapshot loaded from {}.", path);
                        print_df(plan.to_dataframe());
                        bulk = Some(plan);
                        intraday = None;
                        current_roster = None;
                    }
                    Err(e) => println!("Error loading snapshot: {}", e),
                },
                _ => println!("Usage: load snapshot <path>"),
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}

