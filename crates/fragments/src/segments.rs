//! Fragment config scanning and entry rewriting

use autodecomp_core::{Address, Error, FragmentEntry, FragmentKind, Result};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info, warn};

/// A parsed `[address, kind, name]` list item with byte spans into its line
struct ListItem<'a> {
    address: Address,
    kind: &'a str,
    kind_span: Range<usize>,
    name: Option<&'a str>,
}

fn parse_list_item(line: &str) -> Option<ListItem<'_>> {
    let open = line.find('[')?;
    let close = open + line[open..].find(']')?;

    let mut fields = Vec::new();
    let mut offset = open + 1;
    for raw in line[open + 1..close].split(',') {
        let lead = raw.len() - raw.trim_start().len();
        let start = offset + lead;
        fields.push(start..start + raw.trim().len());
        offset += raw.len() + 1;
    }

    if fields.len() < 2 {
        return None;
    }
    let address = line[fields[0].clone()].parse().ok()?;
    let kind = &line[fields[1].clone()];
    if kind.is_empty() {
        return None;
    }
    let name = fields
        .get(2)
        .map(|span| &line[span.clone()])
        .filter(|name| !name.is_empty());

    Some(ListItem {
        address,
        kind,
        kind_span: fields[1].clone(),
        name,
    })
}

fn is_list_item(trimmed: &str) -> bool {
    trimmed.starts_with('-')
}

fn segment_name(trimmed: &str) -> Option<String> {
    let key = trimmed.strip_prefix("- ").unwrap_or(trimmed).trim_start();
    let value = key.strip_prefix("name:")?.trim();
    let value = value.trim_matches(|c| c == '"' || c == '\'');
    (!value.is_empty()).then(|| value.to_string())
}

/// Every well-formed entry of every `section:` list in the config
pub fn scan_entries(config: &Path, section: &str) -> Result<Vec<FragmentEntry>> {
    let content = std::fs::read_to_string(config).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::not_found(config.display().to_string()),
        _ => Error::Io(e),
    })?;
    let entries = entries_in(&content, section, config);
    debug!("Scanned {} entries from {:?}", entries.len(), config);
    Ok(entries)
}

fn entries_in(content: &str, section: &str, config: &Path) -> Vec<FragmentEntry> {
    let header = format!("{}:", section);

    let mut entries = Vec::new();
    let mut segment: Option<String> = None;
    let mut inside: Option<usize> = None;

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(header_indent) = inside {
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if is_list_item(trimmed) && indent >= header_indent {
                match parse_list_item(trimmed) {
                    Some(item) => entries.push(FragmentEntry {
                        address: item.address,
                        kind: FragmentKind::from(item.kind),
                        name: item.name.map(str::to_string),
                        line: idx + 1,
                        raw: line.to_string(),
                        segment: segment.clone(),
                    }),
                    None => warn!("{}:{}: skipping malformed entry `{}`", config.display(), idx + 1, trimmed),
                }
                continue;
            }
            inside = None;
        }

        if trimmed.trim_end() == header {
            inside = Some(indent);
        } else if let Some(name) = segment_name(trimmed) {
            segment = Some(name);
        }
    }

    entries
}

/// Entries of `section` whose kind matches `kind`
pub fn find_entries(config: &Path, section: &str, kind: &FragmentKind) -> Result<Vec<FragmentEntry>> {
    Ok(scan_entries(config, section)?
        .into_iter()
        .filter(|entry| &entry.kind == kind)
        .collect())
}

/// The entry of `section` at `address`
pub fn find_entry(config: &Path, section: &str, address: Address) -> Result<FragmentEntry> {
    scan_entries(config, section)?
        .into_iter()
        .find(|entry| entry.address == address)
        .ok_or_else(|| Error::not_found(format!("no entry at {} in {}", address, config.display())))
}

/// Change the kind of `entry` in place, optionally giving it a name
///
/// Only the entry's own line is rewritten; every other byte of the file is kept.
/// The entry is looked up by address among the list items of `section`,
/// preferring its recorded line when several share the address. Fails with
/// `NotFound` when the entry is gone or no longer has the kind it was scanned with.
pub fn rewrite_entry_kind(
    config: &Path,
    section: &str,
    entry: &FragmentEntry,
    new_kind: &FragmentKind,
    name: Option<&str>,
) -> Result<FragmentEntry> {
    let content = std::fs::read_to_string(config)?;
    let candidates: Vec<usize> = entries_in(&content, section, config)
        .into_iter()
        .filter(|scanned| scanned.address == entry.address)
        .map(|scanned| scanned.line)
        .collect();
    let line = candidates
        .iter()
        .copied()
        .find(|&line| line == entry.line)
        .or_else(|| candidates.first().copied())
        .ok_or_else(|| Error::not_found(format!("entry {} in {}", entry.address, config.display())))?;
    let idx = line - 1;

    let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();

    let body = lines[idx].trim_end_matches(&['\n', '\r'][..]);
    let terminator = &lines[idx][body.len()..];
    let indent = body.len() - body.trim_start().len();

    let item = parse_list_item(&body[indent..])
        .ok_or_else(|| Error::not_found(format!("entry {} in {}", entry.address, config.display())))?;
    if item.kind != entry.kind.as_str() {
        return Err(Error::not_found(format!(
            "entry {} is `{}`, not `{}`",
            entry.address, item.kind, entry.kind
        )));
    }

    let mut replacement = new_kind.as_str().to_string();
    let assigned = match (item.name, name) {
        (Some(existing), _) => Some(existing.to_string()),
        (None, Some(name)) => {
            replacement.push_str(", ");
            replacement.push_str(name);
            Some(name.to_string())
        }
        (None, None) => None,
    };

    let span = indent + item.kind_span.start..indent + item.kind_span.end;
    let mut rewritten = body.to_string();
    rewritten.replace_range(span, &replacement);

    info!(
        "{}:{}: `{}` -> `{}`",
        config.display(),
        idx + 1,
        body.trim(),
        rewritten.trim()
    );

    let new_line = format!("{}{}", rewritten, terminator);
    lines[idx] = new_line;
    std::fs::write(config, lines.concat())?;

    Ok(FragmentEntry {
        kind: new_kind.clone(),
        name: assigned,
        line: idx + 1,
        raw: rewritten,
        ..entry.clone()
    })
}
