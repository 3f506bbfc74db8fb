use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytebus_node::Node;
use tracing::info;

use crate::cmd::{open_for_listen, parse_endpoint, AnyTransport, ListenArgs};
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_frame, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(2);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let endpoint = parse_endpoint(&args.endpoint)?;
    let transport = open_for_listen(&endpoint)?;

    // One handler slot per possible message id; the filter decides which ids
    // get one.
    let mut node: Node<AnyTransport, 256> = Node::new(transport, args.max_payload);

    let printed: Rc<RefCell<usize>> = Rc::default();
    let ids: Vec<u8> = match &args.ids {
        Some(ids) => ids.clone(),
        None => (0..=u8::MAX).collect(),
    };

    for id in ids {
        let counter = Rc::clone(&printed);
        node.register(id, move |payload, hash| {
            print_frame(id, hash, payload, format);
            *counter.borrow_mut() += 1;
            Ok(())
        })
        .map_err(|err| CliError::new(INTERNAL, format!("handler registration failed: {err}")))?;
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    info!(endpoint = %args.endpoint, "listening");

    while running.load(Ordering::SeqCst) {
        node.poll();

        if let Some(count) = args.count {
            if *printed.borrow() >= count {
                return Ok(SUCCESS);
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
