//! A counter app wired to a keyed store

use keyed_store::{Callback, Destroy, KeyedStore, Record, Update};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Count,
    Step,
    History,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Number(i64),
    List(Vec<i64>),
}

impl Value {
    fn number(&self) -> i64 {
        match self {
            Value::Number(n) => *n,
            Value::List(_) => 0,
        }
    }
}

impl keyed_store::FieldValue for Value {
    fn is_identical(&self, other: &Self) -> bool {
        matches!((self, other), (Value::Number(a), Value::Number(b)) if a == b)
    }
}

fn main() -> keyed_store::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    println!("=== Counter App ===\n");

    let store = KeyedStore::builder()
        .label("counter")
        .defaults(Record::from([
            (Field::Count, Value::Number(0)),
            (Field::Step, Value::Number(1)),
            (Field::History, Value::List(Vec::new())),
        ]))
        .build();

    // Render whenever the count changes
    let render = Callback::new(|value: Option<&Value>| {
        println!("count = {}", value.map_or(0, Value::number))
    });
    store.subscribe(Field::Count, &render)?;

    // Append every count to the history
    let record = Callback::new({
        let store = store.clone();
        move |value: Option<&Value>| {
            let n = value.map_or(0, Value::number);
            let _ = store.update(Field::History, move |history| {
                let mut list = match history {
                    Some(Value::List(list)) => list.clone(),
                    _ => Vec::new(),
                };
                list.push(n);
                Value::List(list)
            });
        }
    });
    store.subscribe(Field::Count, &record)?;

    println!("Incrementing three times:");
    for _ in 0..3 {
        let step = store.get(&Field::Step)?.map_or(1, |v| v.number());
        store.apply(
            Field::Count,
            Update::with(move |count| Value::Number(count.map_or(0, Value::number) + step)),
        )?;
    }

    println!("\nSetting the same count again (no render):");
    let current = store.get(&Field::Count)?.unwrap_or(Value::Number(0));
    store.set(Field::Count, current)?;

    println!("\nBumping count and step together:");
    store.set_many(&[Field::Count, Field::Step], |mut values| {
        values.insert(Field::Count, Value::Number(100));
        values.insert(Field::Step, Value::Number(10));
        values
    })?;

    println!("\nHistory: {:?}", store.get(&Field::History)?);

    println!("\nResetting to defaults:");
    store.restore_default(None)?;
    println!("state: {:?}", *store.get_all()?);

    store.destroy(Destroy::Store)?;
    println!("\nStore destroyed: {}", store.is_destroyed());

    Ok(())
}
