use bevy::{log::LogPlugin, prelude::*};
use clap::{Parser, Subcommand};
use part_placement::{config::*, plugin::*, OverlapPhase, PartMode, PlacementConfig};
use std::{
    error::Error,
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// Write the default outline config to a file
    #[command(arg_required_else_help = true)]
    Write {
        /// The path to write
        #[arg(required = true, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,
    },
    /// Hold a replacement part inside an outline and report the verdicts
    Simulate {
        /// Config of the outline site; defaults to an outline part
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Rotation of the replacement about the vertical axis, in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        degrees: f32,
        /// Sideways offset of the replacement, in meters
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset: f32,
        /// Overlap ticks to run before the part is pulled out
        #[arg(long, default_value_t = 90)]
        ticks: u32,
    },
}

#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    subcommand: Subcommands,
}

const ORANGE: MaterialHandle = Handle::weak_from_u128(0x5a1e_0001);
const GREEN: MaterialHandle = Handle::weak_from_u128(0x5a1e_0002);
const RED: MaterialHandle = Handle::weak_from_u128(0x5a1e_0003);
const STEEL: MaterialHandle = Handle::weak_from_u128(0x5a1e_0004);
const BRASS: MaterialHandle = Handle::weak_from_u128(0x5a1e_0005);

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.subcommand {
        Subcommands::Write { path } => write_config(path),
        Subcommands::Simulate {
            config,
            degrees,
            offset,
            ticks,
        } => simulate(config, degrees, offset, ticks),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn write_config(path: PathBuf) -> Result<(), Box<dyn Error>> {
    let config = PlacementConfig::with_mode(PartMode::OutlinePart);
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(config.to_json_pretty()?.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn simulate(
    config: Option<PathBuf>,
    degrees: f32,
    offset: f32,
    ticks: u32,
) -> Result<(), Box<dyn Error>> {
    let config = match config {
        Some(path) => PlacementConfig::load(path)?,
        None => PlacementConfig::with_mode(PartMode::OutlinePart),
    };

    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        LogPlugin::default(),
        TransformPlugin,
        HierarchyPlugin,
        PlacementPlugin,
    ))
    .insert_resource(NamedMaterials(
        [
            (DEFAULT_OUTLINE_MATERIAL, ORANGE),
            (ACCEPTABLE_MATERIAL, GREEN),
            (UNACCEPTABLE_MATERIAL, RED),
        ]
        .into_iter()
        .map(|(name, handle)| (name.to_owned(), handle))
        .collect(),
    ));

    let world = app.world_mut();
    // An outline of a pump housing with its impeller, and a loose impeller.
    let housing = world
        .spawn(PartBundle::new("housing", Transform::IDENTITY, vec![STEEL]))
        .id();
    let impeller = world
        .spawn(PartBundle::new(
            "impeller",
            Transform::from_xyz(0.0, 0.4, 0.0),
            vec![BRASS, STEEL],
        ))
        .insert(PartExtents(Vec3::new(0.2, 0.05, 0.2)))
        .id();
    world.entity_mut(housing).add_child(impeller);
    let replacement = world
        .spawn(PartBundle::new(
            "impeller",
            Transform::from_xyz(offset, 0.4, 0.0)
                .with_rotation(Quat::from_rotation_y(degrees.to_radians())),
            vec![BRASS, STEEL],
        ))
        .insert(PartExtents(Vec3::new(0.2, 0.05, 0.2)))
        .id();

    // Propagate transforms before the site records its target poses.
    app.update();
    attach_site(app.world_mut(), housing, &config)?;

    let mut accepted = 0;
    let mut rejected = 0;
    for tick in 0..=ticks {
        let phase = match tick {
            0 => OverlapPhase::Enter,
            t if t == ticks => OverlapPhase::Exit,
            _ => OverlapPhase::Stay,
        };
        app.world_mut().send_event(PlacementOverlap {
            site: housing,
            other: replacement,
            phase,
        });
        app.update();
        let verdicts: Vec<PlacementVerdict> = app
            .world_mut()
            .resource_mut::<Events<PlacementVerdict>>()
            .drain()
            .collect();
        for verdict in verdicts {
            let a = verdict.attempt;
            info!(
                "tick {tick}: {} ({:.2} deg, {:.3} m)",
                if verdict.accepted() { "acceptable" } else { "unacceptable" },
                a.rotation_delta,
                a.position_delta
            );
            if verdict.accepted() {
                accepted += 1;
            } else {
                rejected += 1;
            }
        }
    }
    info!("{accepted} acceptable, {rejected} unacceptable placements over {ticks} ticks");
    Ok(())
}
