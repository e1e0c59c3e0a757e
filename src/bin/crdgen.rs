use coherence_operator::crd::CoherenceCluster;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&CoherenceCluster::crd())?);
    Ok(())
}
