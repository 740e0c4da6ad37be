use crate::error::{BspError, EntityParseError};

/// One `input,param,delay,times_to_fire` event connection (spec.md §4.3).
/// `name` is the key the connection was filed under (e.g. `"OnTrigger"`),
/// kept alongside the parsed fields so the line can be re-emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub name: String,
    pub target: String,
    pub input: String,
    pub param: String,
    pub delay: f32,
    pub times_to_fire: i32,
}

/// One entity: an ordered list of key/value pairs plus its output
/// connections, kept separate because an output's value is structured and
/// its key may repeat (an entity can fire the same output at multiple
/// targets).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    pub keys: Vec<(String, String)>,
    pub outputs: Vec<Output>,
}

impl Entity {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn classname(&self) -> Option<&str> {
        self.get("classname")
    }
}

/// The decoded `ENTITIES` lump: the mandatory `worldspawn` entity plus every
/// other entity, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Vmf {
    pub spawn: Entity,
    pub entities: Vec<Entity>,
}

/// Which byte separates an output's fields on write. Reading always accepts
/// either; the file version a map targets determines which one the engine
/// itself will write (0x1D only appears from Left 4 Dead 2 onward).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSeparator {
    Comma,
    FieldSeparator,
}

const FIELD_SEPARATOR: u8 = 0x1D;

pub fn read_ent_data(data: &[u8]) -> Result<Vmf, BspError> {
    let mut lines = split_lines(data).into_iter();
    let mut spawn: Option<Entity> = None;
    let mut entities = Vec::new();

    loop {
        let Some(line) = lines.next() else {
            return Err(EntityParseError::UnbalancedBraces("file ended without a NUL terminator").into());
        };
        if line.is_empty() {
            continue;
        }
        if line == [0u8] {
            break;
        }
        if line != b"{" {
            return Err(EntityParseError::OutsideBraces.into());
        }

        let entity = parse_entity_body(&mut lines)?;
        if spawn.is_none() {
            if entity.classname() != Some("worldspawn") {
                return Err(EntityParseError::MissingWorldspawn.into());
            }
            spawn = Some(entity);
        } else {
            entities.push(entity);
        }
    }

    if lines.next().is_some() {
        return Err(EntityParseError::TrailingData.into());
    }

    let spawn = spawn.ok_or(EntityParseError::MissingWorldspawn)?;
    Ok(Vmf { spawn, entities })
}

fn parse_entity_body<'a>(
    lines: &mut impl Iterator<Item = &'a [u8]>,
) -> Result<Entity, BspError> {
    let mut entity = Entity::default();
    loop {
        let line = lines
            .next()
            .ok_or(EntityParseError::UnbalancedBraces("unterminated entity body"))?;
        if line.is_empty() {
            continue;
        }
        if line == b"}" {
            return Ok(entity);
        }
        let (key, value) = parse_key_value_line(line)?;
        match classify_output(&value) {
            Some(output) => entity.outputs.push(Output { name: key, ..output }),
            None => entity.keys.push((key, value)),
        }
    }
}

fn parse_key_value_line(line: &[u8]) -> Result<(String, String), BspError> {
    let text = String::from_utf8_lossy(line);
    let rest = text
        .strip_prefix('"')
        .ok_or_else(|| EntityParseError::MalformedKeyValue(text.clone().into_owned()))?;
    let (key, rest) = take_quoted(rest)
        .ok_or_else(|| EntityParseError::MalformedKeyValue(text.clone().into_owned()))?;
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix('"')
        .ok_or_else(|| EntityParseError::MalformedKeyValue(text.clone().into_owned()))?;
    let (value, _) = take_quoted(rest)
        .ok_or_else(|| EntityParseError::MalformedKeyValue(text.clone().into_owned()))?;
    Ok((key, value))
}

/// Consume a (possibly `\"`-escaped) quoted token up to its closing `"`,
/// returning the unescaped token and the remainder of the string after that
/// quote.
fn take_quoted(s: &str) -> Option<(String, &str)> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, '"')) => result.push('"'),
                Some((_, other)) => {
                    result.push('\\');
                    result.push(other);
                }
                None => return None,
            },
            '"' => return Some((result, &s[i + 1..])),
            other => result.push(other),
        }
    }
    None
}

fn escape(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Applies the I/O disambiguation rule from spec.md §4.3: a 0x1D byte makes
/// a value unambiguously an output; otherwise exactly four commas make it
/// worth attempting an output parse, falling back to a plain key/value on
/// failure.
fn classify_output(value: &str) -> Option<Output> {
    if value.as_bytes().contains(&FIELD_SEPARATOR) {
        return parse_output_fields(value, FIELD_SEPARATOR as char);
    }
    if value.matches(',').count() == 4 {
        return parse_output_fields(value, ',');
    }
    None
}

fn parse_output_fields(value: &str, sep: char) -> Option<Output> {
    let mut parts = value.splitn(5, sep);
    let target = parts.next()?.to_string();
    let input = parts.next()?.to_string();
    let param = parts.next()?.to_string();
    let delay: f32 = parts.next()?.parse().ok()?;
    let times_to_fire: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Output {
        name: String::new(),
        target,
        input,
        param,
        delay,
        times_to_fire,
    })
}

pub fn write_ent_data(vmf: &Vmf, separator: OutputSeparator) -> Vec<u8> {
    let mut out = Vec::new();
    for entity in std::iter::once(&vmf.spawn).chain(vmf.entities.iter()) {
        out.extend_from_slice(b"{\n");
        for (key, value) in &entity.keys {
            out.extend_from_slice(format!("\"{}\" \"{}\"\n", escape(key), escape(value)).as_bytes());
        }
        for output in &entity.outputs {
            let sep = match separator {
                OutputSeparator::Comma => ',',
                OutputSeparator::FieldSeparator => FIELD_SEPARATOR as char,
            };
            let value = format!(
                "{}{sep}{}{sep}{}{sep}{}{sep}{}",
                output.target, output.input, output.param, output.delay, output.times_to_fire
            );
            out.extend_from_slice(
                format!("\"{}\" \"{}\"\n", escape(&output.name), escape(&value)).as_bytes(),
            );
        }
        out.extend_from_slice(b"}\n");
    }
    out.push(0);
    out
}

fn split_lines(data: &[u8]) -> Vec<&[u8]> {
    data.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worldspawn() -> Entity {
        Entity {
            keys: vec![
                ("classname".to_string(), "worldspawn".to_string()),
                ("mapversion".to_string(), "1".to_string()),
            ],
            outputs: vec![],
        }
    }

    #[test]
    fn round_trips_plain_keyvalues() {
        let vmf = Vmf {
            spawn: worldspawn(),
            entities: vec![],
        };
        let bytes = write_ent_data(&vmf, OutputSeparator::Comma);
        let parsed = read_ent_data(&bytes).unwrap();
        assert_eq!(parsed.spawn, vmf.spawn);
        assert!(parsed.entities.is_empty());
    }

    #[test]
    fn escaped_quotes_round_trip() {
        let mut spawn = worldspawn();
        spawn.keys.push(("message".to_string(), "say \"hi\"".to_string()));
        let vmf = Vmf { spawn, entities: vec![] };
        let bytes = write_ent_data(&vmf, OutputSeparator::Comma);
        let parsed = read_ent_data(&bytes).unwrap();
        assert_eq!(parsed.spawn.get("message"), Some("say \"hi\""));
    }

    #[test]
    fn four_comma_value_parses_as_output() {
        let mut spawn = worldspawn();
        spawn.outputs.push(Output {
            name: "OnMapSpawn".to_string(),
            target: "relay_1".to_string(),
            input: "Trigger".to_string(),
            param: "".to_string(),
            delay: 0.0,
            times_to_fire: -1,
        });
        let vmf = Vmf { spawn, entities: vec![] };
        let bytes = write_ent_data(&vmf, OutputSeparator::Comma);
        let parsed = read_ent_data(&bytes).unwrap();
        assert_eq!(parsed.spawn.outputs.len(), 1);
        assert_eq!(parsed.spawn.outputs[0].target, "relay_1");
        assert_eq!(parsed.spawn.outputs[0].times_to_fire, -1);
    }

    #[test]
    fn field_separator_byte_is_unambiguous_output() {
        let mut spawn = worldspawn();
        spawn.outputs.push(Output {
            name: "OnUser1".to_string(),
            target: "a,b".to_string(),
            input: "Fire".to_string(),
            param: String::new(),
            delay: 0.5,
            times_to_fire: 1,
        });
        let vmf = Vmf { spawn, entities: vec![] };
        let bytes = write_ent_data(&vmf, OutputSeparator::FieldSeparator);
        let parsed = read_ent_data(&bytes).unwrap();
        assert_eq!(parsed.spawn.outputs[0].target, "a,b");
    }

    #[test]
    fn rejects_missing_worldspawn() {
        let mut not_world = Entity::default();
        not_world.keys.push(("classname".to_string(), "info_player_start".to_string()));
        let mut data = Vec::new();
        data.extend_from_slice(b"{\n\"classname\" \"info_player_start\"\n}\n");
        data.push(0);
        assert!(read_ent_data(&data).is_err());
    }
}
