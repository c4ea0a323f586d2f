// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! nblc-resolve: resolve one build configuration and print the result.
//!
//! ```text
//! nblc-resolve <role> <version> [options]
//!
//!   role      base | service
//!   version   1.3 | 1.4
//!
//! Options:
//!   --project unified|split-app|split-bin
//!   --slave               enable the v1.3 base slave sub-mode
//!   --rf                  enable the RF interface
//!   --serial              enable the serial interface
//!   --sniffer             enable sniffer instrumentation
//!   --security <0..2>     MAC security profile
//!   --profile <file.yml>  target profile (default: 1 MiB flash at 0)
//! ```

use std::process::ExitCode;

use nblc_config::{
    Action, BuildSession, ChipFamily, NodeRole, ProjectType, ProtocolVersion, Resolution,
    Selection, TargetProfile,
};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("usage: nblc-resolve <base|service> <1.3|1.4> [options]");
        eprintln!("       (see the tool's source header for the option list)");
        return ExitCode::from(2);
    }

    let selection = match parse_selection(&args) {
        Ok(sel) => sel,
        Err(msg) => {
            eprintln!("nblc-resolve: {}", msg);
            return ExitCode::from(2);
        }
    };

    let profile = match parse_profile(&args) {
        Ok(profile) => profile,
        Err(msg) => {
            eprintln!("nblc-resolve: {}", msg);
            return ExitCode::from(2);
        }
    };

    // Warn about choices the resolver will normalize away, then resolve.
    if let Err(e) = selection.check() {
        eprintln!("warning: {}", e);
    }

    let session = BuildSession::new(profile);
    match session.apply(&selection) {
        Ok(resolution) => {
            print_resolution(&resolution);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("nblc-resolve: configuration rejected: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_selection(args: &[String]) -> Result<Selection, String> {
    let role = match args[0].as_str() {
        "base" => NodeRole::Base,
        "service" => NodeRole::Service,
        other => return Err(format!("unknown role '{}'", other)),
    };
    let version = match args[1].as_str() {
        "1.3" => ProtocolVersion::V1_3,
        "1.4" => ProtocolVersion::V1_4,
        other => return Err(format!("unknown version '{}'", other)),
    };

    let mut sel = Selection::new(role, version);
    let mut it = args[2..].iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--project" => {
                let value = it.next().ok_or("--project needs a value")?;
                sel = sel.project(match value.as_str() {
                    "unified" => ProjectType::Unified,
                    "split-app" => ProjectType::SplitApplication,
                    "split-bin" => ProjectType::SplitBinary,
                    other => return Err(format!("unknown project type '{}'", other)),
                });
            }
            "--slave" => sel = sel.slave_mode(true),
            "--rf" => sel = sel.rf(true),
            "--serial" => sel = sel.serial(true),
            "--sniffer" => sel = sel.sniffer(true),
            "--security" => {
                let value = it.next().ok_or("--security needs a value")?;
                let profile: u8 = value
                    .parse()
                    .map_err(|_| format!("bad security profile '{}'", value))?;
                sel = sel.security_profile(profile);
            }
            "--profile" => {
                // Consumed by parse_profile.
                it.next();
            }
            other => return Err(format!("unknown option '{}'", other)),
        }
    }
    Ok(sel)
}

fn parse_profile(args: &[String]) -> Result<TargetProfile, String> {
    if let Some(pos) = args.iter().position(|a| a == "--profile") {
        let path = args.get(pos + 1).ok_or("--profile needs a file")?;
        return TargetProfile::load(std::path::Path::new(path)).map_err(|e| e.to_string());
    }
    // Default bench target: 1 MiB of flash at zero, 256 KiB of RAM.
    Ok(TargetProfile {
        name: "default-1m".into(),
        chip_family: ChipFamily::Mt,
        flash_base: 0,
        flash_size: 0x0010_0000,
        ram_base: 0x2000_0000,
        ram_size: 0x0004_0000,
    })
}

fn print_resolution(resolution: &Resolution) {
    let resolved = &resolution.resolved;
    println!("branch            {}", resolved.branch.as_str());
    println!("firmware version  {}", resolved.fw_version_tag);
    println!(
        "security profile  {}{}",
        resolved.security_profile.value,
        if resolved.security_profile.read_only {
            " (locked)"
        } else {
            ""
        }
    );
    if let Some(nodes) = resolved.max_nodes {
        println!("max nodes         {}", nodes);
    }
    println!("phy mode          {}", resolved.phy_mode.value.as_str());
    println!();

    println!("load address      {:#010x}", resolution.regions.load_address());
    println!(
        "ram window        {:#010x} + {:#x} (reserved {:#x})",
        resolution.ram.origin, resolution.ram.length, resolution.ram.reserved
    );
    println!();

    if resolution.regions.regions().is_empty() {
        println!("regions           (none: unified image owns the flash)");
    } else {
        println!("{:<16} {:>10} {:>10}  {}", "region", "start", "size", "state");
        for region in resolution.regions.regions() {
            println!(
                "{:<16} {:>#10x} {:>#10x}  {}",
                region.id.as_str(),
                region.start,
                region.size,
                if region.active { "active" } else { "-" }
            );
        }
    }
    println!();

    println!("activation ({} instructions)", resolution.diff.commands().len());
    for command in resolution.diff.commands() {
        let sign = match command.action {
            Action::Enable => '+',
            Action::Disable => '-',
        };
        println!("  {}{}", sign, command.component.as_str());
    }
}
