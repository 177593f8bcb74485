// example/src/main.rs

mod packets;

use eo_codec::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use packets::{CharacterReply, Direction, WalkPlayer};

const CLIENT_PROTOCOL: &str = include_str!("../protocol/client.json");

const PACKETS: &[(u8, u8, Constructor)] = &[
    (WalkPlayer::FAMILY, WalkPlayer::ACTION, construct::<WalkPlayer>),
    (CharacterReply::FAMILY, CharacterReply::ACTION, construct::<CharacterReply>),
];

fn main() -> Result<(), EoError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1) Hand-written packets, routed by their family and action bytes.
    let registry = PacketRegistry::new(PACKETS)?;

    let walk = WalkPlayer {
        direction: Direction::Up,
        timestamp: 1000,
        x:         5,
        y:         7,
    };
    let reply = CharacterReply::Ok {
        names: vec!["ann".to_owned(), "bob".to_owned()],
    };

    for bytes in [write_packet(&walk)?, write_packet(&reply)?] {
        info!(bytes = ?bytes, "sending");
        let packet = registry.read_packet(&bytes)?;
        info!(key = %packet.key(), "received {:?}", packet);

        if let Some(walk) = packet.downcast_ref::<WalkPlayer>() {
            println!("walk {:?} to ({}, {})", walk.direction, walk.x, walk.y);
        }
    }

    // 2) The same packets driven by the JSON catalogue.
    let protocol = compile_protocol(CLIENT_PROTOCOL)?;

    let walk_id = PacketId::new("Walk", "Player");
    let value = Value::object(&walk_id.to_string())
        .with("direction", Value::variant("Direction", "Up"))
        .with("timestamp", Value::Number(1000))
        .with(
            "coords",
            Value::object("Coords")
                .with("x", Value::Number(5))
                .with("y", Value::Number(7)),
        );
    let body = protocol.serialize_packet(&walk_id, &value)?;
    println!("{} = {:02X?}", walk_id, body);
    println!("{}", packet_to_json(&protocol, &walk_id, &body)?);

    let reply_id = PacketId::new("Character", "Reply");
    let reply_bytes = write_packet(&reply)?;
    let body = &reply_bytes[2..];
    let decoded = protocol.deserialize_packet(&reply_id, body)?;
    println!("{:?}", decoded);
    println!("{}", packet_to_json(&protocol, &reply_id, body)?);

    Ok(())
}
