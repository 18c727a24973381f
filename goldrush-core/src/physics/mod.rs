/*!
Kinematics of the robots.

Robots are differential drive platforms with two motor channels: `M0` drives
the left wheel and `M1` the right wheel. The [`unicycle::Unicycle`] model
converts the motor powers into wheel speeds and integrates the pose. There is
no collision nor inertia: the pose only changes while a power is applied.
*/

pub mod unicycle;
