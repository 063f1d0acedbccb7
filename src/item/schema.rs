use std::borrow::Cow;

use super::{Armour, Item, Modifier, Socket, Weapon};
use crate::types::{EvalError, Member, MemberId, MemberKind, Record, Schema, Type, Value};

static INT: Type = Type::Int;
static STR: Type = Type::Str;
static SOCKET_ELEM: Type = Type::Object(&SOCKET);
static MODIFIER_ELEM: Type = Type::Object(&MODIFIER);

const fn field(name: &'static str, id: u16, ty: Type) -> Member {
    Member {
        name,
        id: MemberId(id),
        kind: MemberKind::Field(ty),
    }
}

const fn method(name: &'static str, id: u16, params: &'static [Type], returns: Type) -> Member {
    Member {
        name,
        id: MemberId(id),
        kind: MemberKind::Method { params, returns },
    }
}

mod item_id {
    use crate::types::MemberId;

    pub const NAME: MemberId = MemberId(0);
    pub const BASE_NAME: MemberId = MemberId(1);
    pub const CLASS: MemberId = MemberId(2);
    pub const RARITY: MemberId = MemberId(3);
    pub const ITEM_LEVEL: MemberId = MemberId(4);
    pub const QUALITY: MemberId = MemberId(5);
    pub const STACK_SIZE: MemberId = MemberId(6);
    pub const WIDTH: MemberId = MemberId(7);
    pub const HEIGHT: MemberId = MemberId(8);
    pub const IDENTIFIED: MemberId = MemberId(9);
    pub const CORRUPTED: MemberId = MemberId(10);
    pub const LINKS: MemberId = MemberId(11);
    pub const SOCKET_COUNT: MemberId = MemberId(12);
    pub const SOCKETS: MemberId = MemberId(13);
    pub const MODS: MemberId = MemberId(14);
    pub const TAGS: MemberId = MemberId(15);
    pub const WEAPON: MemberId = MemberId(16);
    pub const ARMOUR: MemberId = MemberId(17);
    pub const HAS_TAG: MemberId = MemberId(18);
    pub const STAT: MemberId = MemberId(19);
    pub const HAS_MOD: MemberId = MemberId(20);
}

static ITEM: Schema = Schema {
    name: "Item",
    members: &[
        field("name", 0, Type::Str),
        field("base_name", 1, Type::Str),
        field("class", 2, Type::Str),
        field("rarity", 3, Type::Str),
        field("item_level", 4, Type::Int),
        field("quality", 5, Type::Int),
        field("stack_size", 6, Type::Int),
        field("width", 7, Type::Int),
        field("height", 8, Type::Int),
        field("identified", 9, Type::Bool),
        field("corrupted", 10, Type::Bool),
        field("links", 11, Type::Int),
        field("socket_count", 12, Type::Int),
        field("sockets", 13, Type::List(&SOCKET_ELEM)),
        field("mods", 14, Type::List(&MODIFIER_ELEM)),
        field("tags", 15, Type::List(&STR)),
        field("weapon", 16, Type::Object(&WEAPON)),
        field("armour", 17, Type::Object(&ARMOUR)),
        method("has_tag", 18, &[Type::Str], Type::Bool),
        method("stat", 19, &[Type::Str], Type::Int),
        method("has_mod", 20, &[Type::Str], Type::Bool),
    ],
};

static SOCKET: Schema = Schema {
    name: "Socket",
    members: &[field("colour", 0, Type::Str), field("group", 1, Type::Int)],
};

static MODIFIER: Schema = Schema {
    name: "Modifier",
    members: &[
        field("name", 0, Type::Str),
        field("tier", 1, Type::Int),
        field("values", 2, Type::List(&INT)),
    ],
};

static WEAPON: Schema = Schema {
    name: "Weapon",
    members: &[
        field("physical_min", 0, Type::Int),
        field("physical_max", 1, Type::Int),
        field("attacks_per_second", 2, Type::Float),
        field("critical_chance", 3, Type::Float),
        method("dps", 4, &[], Type::Float),
    ],
};

static ARMOUR: Schema = Schema {
    name: "Armour",
    members: &[
        field("armour", 0, Type::Int),
        field("evasion", 1, Type::Int),
        field("energy_shield", 2, Type::Int),
    ],
};

fn no_member(owner: &str, member: MemberId) -> EvalError {
    EvalError::Record(format!("{owner} has no member #{}", member.0))
}

fn str_arg<'v>(args: &'v [Value<'_>]) -> Result<&'v str, EvalError> {
    args.first()
        .and_then(Value::as_str)
        .ok_or(EvalError::UnexpectedValue {
            expected: "string",
            found: args.first().map_or("nothing", Value::kind),
        })
}

fn absent(member: &str) -> EvalError {
    EvalError::Absent {
        member: member.to_owned(),
    }
}

fn to_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl Record for Item {
    fn schema() -> &'static Schema {
        &ITEM
    }

    fn get(&self, member: MemberId, args: &[Value<'_>]) -> Result<Value<'_>, EvalError> {
        use item_id::*;

        Ok(match member {
            NAME => self.name.as_str().into(),
            BASE_NAME => Value::str(&self.base_name),
            CLASS => Value::str(&self.class),
            RARITY => Value::str(self.rarity.as_str()),
            ITEM_LEVEL => self.item_level.into(),
            QUALITY => self.quality.into(),
            STACK_SIZE => self.stack_size.into(),
            WIDTH => self.width.into(),
            HEIGHT => self.height.into(),
            IDENTIFIED => self.identified.into(),
            CORRUPTED => self.corrupted.into(),
            LINKS => Value::Int(self.links()),
            SOCKET_COUNT => Value::Int(to_int(self.sockets.len())),
            SOCKETS => Value::List(
                self.sockets
                    .iter()
                    .map(|s| Value::Object(s as &dyn Record))
                    .collect(),
            ),
            MODS => Value::List(
                self.mods
                    .iter()
                    .map(|m| Value::Object(m as &dyn Record))
                    .collect(),
            ),
            TAGS => Value::List(self.tags.iter().map(|t| Value::str(t)).collect()),
            WEAPON => match &self.weapon {
                Some(weapon) => Value::Object(weapon),
                None => return Err(absent("weapon")),
            },
            ARMOUR => match &self.armour {
                Some(armour) => Value::Object(armour),
                None => return Err(absent("armour")),
            },
            HAS_TAG => self.has_tag(str_arg(args)?).into(),
            STAT => Value::Int(self.stat(str_arg(args)?)),
            HAS_MOD => self.has_mod(str_arg(args)?).into(),
            other => return Err(no_member("Item", other)),
        })
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.display_name())
    }
}

impl Record for Socket {
    fn schema() -> &'static Schema {
        &SOCKET
    }

    fn get(&self, member: MemberId, _args: &[Value<'_>]) -> Result<Value<'_>, EvalError> {
        match member.0 {
            0 => Ok(self.colour.to_string().into()),
            1 => Ok(Value::Int(i64::from(self.group))),
            _ => Err(no_member("Socket", member)),
        }
    }
}

impl Record for Modifier {
    fn schema() -> &'static Schema {
        &MODIFIER
    }

    fn get(&self, member: MemberId, _args: &[Value<'_>]) -> Result<Value<'_>, EvalError> {
        match member.0 {
            0 => Ok(Value::str(&self.name)),
            1 => Ok(Value::Int(self.tier)),
            2 => Ok(Value::List(self.values.iter().copied().map(Value::Int).collect())),
            _ => Err(no_member("Modifier", member)),
        }
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

impl Record for Weapon {
    fn schema() -> &'static Schema {
        &WEAPON
    }

    fn get(&self, member: MemberId, _args: &[Value<'_>]) -> Result<Value<'_>, EvalError> {
        match member.0 {
            0 => Ok(Value::Int(self.physical_min)),
            1 => Ok(Value::Int(self.physical_max)),
            2 => Ok(Value::Float(self.attacks_per_second)),
            3 => Ok(Value::Float(self.critical_chance)),
            4 => Ok(self.dps().into()),
            _ => Err(no_member("Weapon", member)),
        }
    }
}

impl Record for Armour {
    fn schema() -> &'static Schema {
        &ARMOUR
    }

    fn get(&self, member: MemberId, _args: &[Value<'_>]) -> Result<Value<'_>, EvalError> {
        match member.0 {
            0 => Ok(Value::Int(self.armour)),
            1 => Ok(Value::Int(self.evasion)),
            2 => Ok(Value::Int(self.energy_shield)),
            _ => Err(no_member("Armour", member)),
        }
    }
}
