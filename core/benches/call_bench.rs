use std::fmt;
use std::hint::black_box;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use criterion::{Criterion, criterion_group, criterion_main};
use lkr_exec::{
    DirectCallNode, Frame, FrameDescriptor, FrameSlot, FrameSlotKind, LoopStatus, Node, RepeatingNode, RootNode,
    Runtime, Val,
};
use once_cell::sync::OnceCell;

struct Fib {
    descriptor: Arc<FrameDescriptor>,
    site: OnceCell<DirectCallNode>,
}

impl fmt::Debug for Fib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fib")
    }
}

impl Node for Fib {}

impl RootNode for Fib {
    fn execute(&self, frame: &Frame) -> Result<Val> {
        let n = frame.argument(0).and_then(Val::as_i64).unwrap_or(0);
        if n < 2 {
            return Ok(Val::Long(n));
        }
        let site = self.site.get().ok_or_else(|| anyhow!("fib call site not bound"))?;
        let a = site.call(vec![Val::Long(n - 1)])?.as_i64().unwrap_or(0);
        let b = site.call(vec![Val::Long(n - 2)])?.as_i64().unwrap_or(0);
        Ok(Val::Long(a + b))
    }

    fn frame_descriptor(&self) -> &Arc<FrameDescriptor> {
        &self.descriptor
    }

    fn name(&self) -> &str {
        "fib"
    }
}

#[derive(Debug)]
struct Sum {
    i: FrameSlot,
    acc: FrameSlot,
}

impl Node for Sum {}

impl RepeatingNode for Sum {
    fn execute_repeating(&self, frame: &Frame) -> Result<LoopStatus> {
        let i = frame.get_long(&self.i)?;
        if i == 0 {
            return Ok(LoopStatus::Break(Val::Long(frame.get_long(&self.acc)?)));
        }
        frame.set_long(&self.acc, frame.get_long(&self.acc)? + i)?;
        frame.set_long(&self.i, i - 1)?;
        Ok(LoopStatus::Continue)
    }

    fn as_node(&self) -> Option<&dyn Node> {
        Some(self)
    }
}

fn bench_calls(c: &mut Criterion) {
    let rt = Runtime::new();
    let fib = Arc::new(Fib {
        descriptor: Arc::new(FrameDescriptor::new()),
        site: OnceCell::new(),
    });
    let target = rt.create_call_target(fib.clone());
    let site = rt.create_direct_call_node(Some(target.clone())).expect("target present");
    let _ = fib.site.set(site);

    c.bench_function("direct_call_fib_15", |b| {
        b.iter(|| black_box(target.call(vec![Val::Long(black_box(15))]).expect("fib runs")))
    });
}

fn bench_loop(c: &mut Criterion) {
    let rt = Runtime::new();
    let desc = Arc::new(FrameDescriptor::new());
    let i = desc.add_slot("i", FrameSlotKind::Long).expect("fresh slot");
    let acc = desc.add_slot("acc", FrameSlotKind::Long).expect("fresh slot");
    let lp = rt
        .create_loop_node(Arc::new(Sum {
            i: i.clone(),
            acc: acc.clone(),
        }))
        .expect("sum is a node");

    c.bench_function("loop_sum_1000", |b| {
        b.iter(|| {
            let frame = rt.create_virtual_frame(vec![], Arc::clone(&desc));
            frame.set_long(&i, 1000).expect("writable");
            frame.set_long(&acc, 0).expect("writable");
            black_box(lp.execute_loop(&frame).expect("loop runs"))
        })
    });
}

criterion_group!(benches, bench_calls, bench_loop);
criterion_main!(benches);
