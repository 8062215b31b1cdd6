// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Small demo CLI: builds a fixed diamond-shaped graph of text-processing
//! work units over the input text and runs its `exec` phase.
//!
//! Configuration-file parsing is out of scope for this crate, so the graph
//! here is wired up in code rather than loaded from a config file.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dagflow::node::{NodeId, Output, ResultId};
use dagflow::orchestrator::RunOrchestrator;
use dagflow::outcome::Outcome;
use dagflow::work_unit::WorkUnit;

struct TextUnit<F> {
    id: NodeId,
    inputs: Vec<ResultId>,
    outputs: Vec<ResultId>,
    transform: F,
}

#[async_trait]
impl<F> WorkUnit<String> for TextUnit<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn id(&self) -> &NodeId {
        &self.id
    }
    fn input_ids(&self) -> &[ResultId] {
        &self.inputs
    }
    fn output_ids(&self) -> &[ResultId] {
        &self.outputs
    }

    async fn prepare(&self, inputs: Vec<Output<String>>) -> anyhow::Result<Vec<Output<String>>> {
        self.exec(inputs).await
    }

    async fn init(&self, inputs: Vec<Output<String>>) -> anyhow::Result<Vec<Output<String>>> {
        self.exec(inputs).await
    }

    async fn exec(&self, inputs: Vec<Output<String>>) -> anyhow::Result<Vec<Output<String>>> {
        let joined = inputs
            .iter()
            .map(|o| o.value.as_str())
            .collect::<Vec<_>>()
            .join("");
        let transformed = (self.transform)(&joined);
        Ok(self
            .outputs
            .iter()
            .map(|id| Output::new(id.clone(), transformed.clone()))
            .collect())
    }
}

fn unit<F>(id: &str, inputs: &[&str], outputs: &[&str], transform: F) -> Arc<dyn WorkUnit<String>>
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    Arc::new(TextUnit {
        id: NodeId::new(id),
        inputs: inputs.iter().map(|s| ResultId::new(*s)).collect(),
        outputs: outputs.iter().map(|s| ResultId::new(*s)).collect(),
        transform,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let input_text = args.get(1).cloned().unwrap_or_else(|| "hello world".to_string());

    println!("DAG scheduler demo");
    println!("==================");
    println!("Input: \"{input_text}\"\n");

    // Diamond: uppercase and reverse run in parallel off the seeded input,
    // concatenate joins them.
    let units = vec![
        unit("uppercase", &["seed"], &["upper"], |s| s.to_uppercase()),
        unit("reverse", &["seed"], &["reversed"], |s| s.chars().rev().collect()),
        unit("concatenate", &["upper", "reversed"], &["joined"], |s| s.to_string()),
    ];

    let mut seeds = HashMap::new();
    seeds.insert(ResultId::new("seed"), input_text.clone());

    let orchestrator = RunOrchestrator::new(units, "demo-run", seeds, 4)?;
    println!("{}\n", orchestrator.render());

    let outcomes = orchestrator.exec().await?;
    for outcome in outcomes {
        match outcome {
            Outcome::Success(results) => {
                for result in results {
                    println!("✅ {} = \"{}\"", result.result_id, result.value);
                }
            }
            Outcome::Failure(err) => println!("❌ {err}"),
        }
    }

    Ok(())
}
