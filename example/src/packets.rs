// example/src/packets.rs

use eo_codec::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Left,
    Up,
    Right,
    Unrecognized(u32),
}

impl From<u32> for Direction {
    fn from(value: u32) -> Direction {
        match value {
            0 => Direction::Down,
            1 => Direction::Left,
            2 => Direction::Up,
            3 => Direction::Right,
            other => Direction::Unrecognized(other),
        }
    }
}

impl From<Direction> for u32 {
    fn from(value: Direction) -> u32 {
        match value {
            Direction::Down => 0,
            Direction::Left => 1,
            Direction::Up => 2,
            Direction::Right => 3,
            Direction::Unrecognized(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkPlayer {
    pub direction: Direction,
    pub timestamp: u32,
    pub x:         u32,
    pub y:         u32,
}

impl EoSerialize for WalkPlayer {
    fn serialize(&self, writer: &mut EoWriter) -> Result<(), EoError> {
        writer.add_char(self.direction.into())?;
        writer.add_three(self.timestamp)?;
        writer.add_char(self.x)?;
        writer.add_char(self.y)?;
        Ok(())
    }

    fn deserialize(reader: &mut EoReader) -> Result<Self, EoError> {
        Ok(WalkPlayer {
            direction: reader.get_char().into(),
            timestamp: reader.get_three(),
            x:         reader.get_char(),
            y:         reader.get_char(),
        })
    }
}

impl Packet for WalkPlayer {
    const FAMILY: u8 = 4;
    const ACTION: u8 = 1;
}

/// Server reply to a character creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterReply {
    Ok { names: Vec<String> },
    Exists,
    Unrecognized(u32),
}

impl EoSerialize for CharacterReply {
    fn serialize(&self, writer: &mut EoWriter) -> Result<(), EoError> {
        match self {
            CharacterReply::Ok { names } => {
                writer.add_short(5)?;
                let mut writer = writer.sanitized();
                writer.add_char(names.len() as u32)?;
                writer.add_char(0)?;
                writer.add_byte(BREAK_BYTE);
                for name in names {
                    writer.add_string(name);
                    writer.add_byte(BREAK_BYTE);
                }
            }
            CharacterReply::Exists => writer.add_short(1)?,
            CharacterReply::Unrecognized(code) => writer.add_short(*code)?,
        }
        Ok(())
    }

    fn deserialize(reader: &mut EoReader) -> Result<Self, EoError> {
        Ok(match reader.get_short() {
            5 => {
                let mut reader = reader.chunked();
                let count = reader.get_char();
                reader.get_char();
                reader.next_chunk()?;
                let mut names = Vec::new();
                for _ in 0..count {
                    names.push(reader.get_string());
                    reader.next_chunk()?;
                }
                CharacterReply::Ok { names }
            }
            1 => CharacterReply::Exists,
            other => CharacterReply::Unrecognized(other),
        })
    }
}

impl Packet for CharacterReply {
    const FAMILY: u8 = 2;
    const ACTION: u8 = 3;
}
