use catalog::{run, PipelineConfig};
use log::error;

fn main() {
    env_logger::init();

    match run(&PipelineConfig::default()) {
        Ok(summary) => print!("{}", summary),
        Err(err) => {
            error!("run aborted: {:?}", err);
            println!("{}", err);
        }
    }
}
