mod platform;

fn main() -> anyhow::Result<()> {
    platform::run_agent(platform::AgentOptions::from_env())
}
